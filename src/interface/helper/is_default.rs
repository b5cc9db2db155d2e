pub trait IsDefault {
    fn is_default(&self) -> bool;
}
impl<T> IsDefault for T
where
    T: Default + PartialEq<T>,
{
    fn is_default(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_default() {
        assert!(None::<bool>.is_default());
        assert!(!Some(false).is_default());
        assert!(String::new().is_default());
    }
}
