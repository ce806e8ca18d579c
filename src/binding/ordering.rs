//! Dense 1-based ordering shared by modifiers and conditions.
//!
//! After every insert, remove or move the `order` of each item equals its
//! position in the list plus one.

/// An item with a 1-based position among its siblings.
pub trait Ordered {
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
}

/// Sort by current `order` (stable) and renumber 1..N.
pub fn apply_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(|item| item.order());
    renumber(items);
}

/// Renumber 1..N in list order.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(index as u32 + 1);
    }
}

/// Move the item at `index` so that it ends up with `order` (clamped to 1..N).
pub fn move_to<T: Ordered>(items: &mut Vec<T>, index: usize, order: u32) {
    if index >= items.len() {
        return;
    }
    let item = items.remove(index);
    let target = (order.max(1) as usize - 1).min(items.len());
    items.insert(target, item);
    renumber(items);
}
