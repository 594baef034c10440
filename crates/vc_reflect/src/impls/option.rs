use alloc::boxed::Box;

use crate::Reflect;
use crate::info::TypeHint;
use crate::ops::Optional;
use crate::reflection::impl_reflect_cast_fn;

impl<T: Reflect> Reflect for Option<T> {
    impl_reflect_cast_fn!(Optional);
}

impl<T: Reflect> Optional for Option<T> {
    #[inline]
    fn get(&self) -> Option<&dyn Reflect> {
        self.as_ref().map(|value| value as &dyn Reflect)
    }

    #[inline]
    fn get_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut().map(|value| value as &mut dyn Reflect)
    }

    #[inline]
    fn take(&mut self) -> Option<Box<dyn Reflect>> {
        Option::take(self).map(|value| Box::new(value) as Box<dyn Reflect>)
    }

    fn insert_boxed(
        &mut self,
        value: Box<dyn Reflect>,
    ) -> Result<Option<Box<dyn Reflect>>, Box<dyn Reflect>> {
        let value = value.take::<T>()?;
        Ok(Option::replace(self, value).map(|old| Box::new(old) as Box<dyn Reflect>))
    }

    #[inline]
    fn inner_type(&self) -> TypeHint {
        TypeHint::of::<T>()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::format;
    use alloc::string::String;

    use crate::{Reflect, ReflectMut};

    #[test]
    fn take_clears_the_slot() {
        let mut slot = Some(String::from("x"));
        let ReflectMut::Optional(opt) = slot.reflect_mut() else {
            panic!("expected an optional");
        };
        let old = opt.take().unwrap();
        assert_eq!(old.take::<String>().unwrap(), "x");
        assert!(slot.is_none());
    }

    #[test]
    fn insert_wrong_type_is_rejected() {
        let mut slot: Option<u8> = None;
        let ReflectMut::Optional(opt) = slot.reflect_mut() else {
            panic!("expected an optional");
        };
        assert!(opt.insert_boxed(Box::new(1_u16)).is_err());
    }

    #[test]
    fn debug_shows_variant() {
        let some: &dyn Reflect = &Some(1_u8);
        let none: &dyn Reflect = &None::<u8>;
        assert_eq!(format!("{some:?}"), "Some(1)");
        assert_eq!(format!("{none:?}"), "None");
    }
}
