use crate::scene::ObjectId;

/// Selection after a click: the clicked object, or nothing when the click
/// hit empty space or the object that was already selected.
pub fn toggle_selection(current: Option<&ObjectId>, hit: Option<&ObjectId>) -> Option<ObjectId> {
    match (current, hit) {
        (_, None) => None,
        (Some(current), Some(hit)) if current == hit => None,
        (_, Some(hit)) => Some(hit.clone()),
    }
}
