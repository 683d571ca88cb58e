/// Trait for objects that can be referenced through a [`Handle`](super::Handle).
pub trait Asset: Send + Sync + 'static {}
