/// Fill what `self` leaves unspecified from `other`. Values already present in `self` win.
pub trait Coalesce<O = Self> {
    fn coalesce(self, other: &O) -> Self;
}

impl<T: Clone> Coalesce for Option<T> {
    fn coalesce(self, other: &Self) -> Self {
        self.or_else(|| other.clone())
    }
}
