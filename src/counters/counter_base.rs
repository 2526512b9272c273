/// A distinct-element counter fed one element at a time.
///
/// `T` is the element type the counter accepts; sketches accept anything
/// hashable, the exact counter needs owned, comparable elements.
pub trait Counter<T: ?Sized> {
    fn add(&mut self, item: &T);
    fn estimate(&self) -> f64;
}
