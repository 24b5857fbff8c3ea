/// A scene node that shows exactly one of its children.
///
/// Backed by a rendering's three-slot ring or by an animation's frame set.
/// Implementations must be cheap: callers may hold their own locks while
/// switching.
pub trait SwitchTarget: Send + Sync {
    fn child_count(&self) -> usize;

    fn set_visible_child(&self, index: usize);
}
