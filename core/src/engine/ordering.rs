//! Ordering Planner
//!
//! Pure functions over in-memory snapshots. Each planner returns the list of
//! mutations that turns the snapshot into the target ordering; only fields
//! that actually change are included, so an empty plan means "nothing to do".
//!
//! Indices are positions in the sequence sorted by `(order, id)`. A
//! destination index is the final position of the moved entity and is
//! clamped to the end of the sequence.

use crate::domain::{Collection, CollectionId, Container, Counter, CounterId, Entity};
use crate::repository::{CollectionField, CounterField, Mutation};

/// Sort entities into display order; ties on `order` fall back to the id
pub fn sort_by_order<T: Entity>(items: &mut [T]) {
    items.sort_by_key(|item| (item.order(), item.id()));
}

/// Members of `container`, in display order
pub fn container_members(counters: &[Counter], container: Container) -> Vec<Counter> {
    let mut members: Vec<Counter> = counters
        .iter()
        .filter(|c| Container::from(c.collection) == container)
        .cloned()
        .collect();
    sort_by_order(&mut members);
    members
}

/// Position of `id` inside an ordered member list
pub fn index_of<T: Entity>(members: &[T], id: T::Id) -> Option<usize> {
    members.iter().position(|m| m.id() == id)
}

/// Clamp an insertion index into `[0, len]`
pub fn clamp_insert(index: usize, len: usize) -> usize {
    index.min(len)
}

/// Move the element at `from` so that it ends up at `to`.
///
/// Returns `None` when `from` is out of range.
pub fn reorder<T: Clone>(seq: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from >= seq.len() {
        return None;
    }
    let mut next = seq.to_vec();
    let moved = next.remove(from);
    let to = clamp_insert(to, next.len());
    next.insert(to, moved);
    Some(next)
}

/// `(id, new_order)` for every entity whose order differs from its index
pub fn renumber<T: Entity>(seq: &[T]) -> Vec<(T::Id, i32)> {
    seq.iter()
        .enumerate()
        .filter(|(idx, item)| item.order() != *idx as i32)
        .map(|(idx, item)| (item.id(), idx as i32))
        .collect()
}

fn counter_order_mutations(seq: &[Counter]) -> Vec<Mutation> {
    renumber(seq)
        .into_iter()
        .map(|(id, order)| Mutation::counter(id, vec![CounterField::Order(order)]))
        .collect()
}

fn collection_order_mutations(seq: &[Collection]) -> Vec<Mutation> {
    renumber(seq)
        .into_iter()
        .map(|(id, order)| Mutation::collection(id, vec![CollectionField::Order(order)]))
        .collect()
}

/// Whether dropping `counter_id` at `(dest, dest_index)` would leave it
/// where it already is
pub fn is_self_drop(
    members: &[Counter],
    source: Container,
    counter_id: CounterId,
    dest: Container,
    dest_index: usize,
) -> bool {
    if source != dest || members.is_empty() {
        return false;
    }
    match index_of(members, counter_id) {
        Some(current) => current == dest_index.min(members.len() - 1),
        None => false,
    }
}

/// Final position for a drop into insertion gap `gap`.
///
/// `current` is the dragged counter's index when the gap belongs to its own
/// container. Gaps below it shift up by one once it is lifted out; the gaps
/// directly above and below it are self-drops (`None`).
pub fn gap_to_position(current: Option<usize>, gap: usize) -> Option<usize> {
    match current {
        Some(current) if gap == current || gap == current + 1 => None,
        Some(current) if gap > current => Some(gap - 1),
        _ => Some(gap),
    }
}

/// Plan a reorder inside one container.
///
/// Also repairs gaps or duplicates already present in `members`.
pub fn plan_move_within(members: &[Counter], from: usize, to: usize) -> Option<Vec<Mutation>> {
    reorder(members, from, to).map(|seq| counter_order_mutations(&seq))
}

/// Plan moving `counter` out of `source_members` into `dest` at `dest_index`.
///
/// `dest_members` must not contain the counter. When source and destination
/// are the same container use [`plan_move_within`] instead.
pub fn plan_move_across(
    counter: &Counter,
    source_members: &[Counter],
    dest: Container,
    dest_members: &[Counter],
    dest_index: usize,
) -> Vec<Mutation> {
    let remaining: Vec<Counter> = source_members
        .iter()
        .filter(|c| c.id != counter.id)
        .cloned()
        .collect();
    let mut plan = counter_order_mutations(&remaining);

    let mut arrived = dest_members.to_vec();
    let at = clamp_insert(dest_index, arrived.len());
    arrived.insert(at, counter.clone());

    for (idx, member) in arrived.iter().enumerate() {
        let mut fields = Vec::new();
        if member.id == counter.id && member.collection != dest.collection_id() {
            fields.push(CounterField::Collection(dest.collection_id()));
        }
        if member.order != idx as i32 {
            fields.push(CounterField::Order(idx as i32));
        }
        if !fields.is_empty() {
            plan.push(Mutation::counter(member.id, fields));
        }
    }
    plan
}

/// Plan a reorder of the collection list
pub fn plan_move_collection(collections: &[Collection], from: usize, to: usize) -> Option<Vec<Mutation>> {
    reorder(collections, from, to).map(|seq| collection_order_mutations(&seq))
}

/// Plan deleting one counter and closing the gap it leaves
pub fn plan_counter_removal(members: &[Counter], id: CounterId) -> Vec<Mutation> {
    let remaining: Vec<Counter> = members.iter().filter(|c| c.id != id).cloned().collect();
    let mut plan = vec![Mutation::DeleteCounter(id)];
    plan.extend(counter_order_mutations(&remaining));
    plan
}

/// Plan deleting a collection together with its members, then closing the
/// gap in the collection list
pub fn plan_collection_removal(
    collections: &[Collection],
    id: CollectionId,
    members: &[Counter],
) -> Vec<Mutation> {
    let mut plan: Vec<Mutation> = members.iter().map(|c| Mutation::DeleteCounter(c.id)).collect();
    plan.push(Mutation::DeleteCollection(id));
    let remaining: Vec<Collection> = collections.iter().filter(|c| c.id != id).cloned().collect();
    plan.extend(collection_order_mutations(&remaining));
    plan
}

/// Plan renormalizing every container and the collection list
pub fn plan_repair(counters: &[Counter], collections: &[Collection]) -> Vec<Mutation> {
    let mut sorted_collections = collections.to_vec();
    sort_by_order(&mut sorted_collections);
    let mut plan = collection_order_mutations(&sorted_collections);

    let containers = std::iter::once(Container::Pool)
        .chain(sorted_collections.iter().map(|c| Container::Collection(c.id)));
    for container in containers {
        plan.extend(counter_order_mutations(&container_members(counters, container)));
    }
    plan
}

/// Verify that orders form exactly `0..n-1`
pub fn check_contiguous<T: Entity>(items: &[T]) -> Result<(), String> {
    let mut orders: Vec<i32> = items.iter().map(|i| i.order()).collect();
    orders.sort_unstable();
    for (expected, actual) in orders.iter().enumerate() {
        if *actual != expected as i32 {
            return Err(format!(
                "expected order {} at position {}, found {} (orders: {:?})",
                expected, expected, actual, orders
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(id: u32, order: i32, collection: Option<u32>) -> Counter {
        let mut c = Counter::new(CounterId(id), format!("Counter {}", id));
        c.order = order;
        c.collection = collection.map(CollectionId);
        c
    }

    fn apply(members: &[Counter], plan: &[Mutation]) -> Vec<Counter> {
        let mut next = members.to_vec();
        for mutation in plan {
            if let Mutation::UpdateCounter { id, fields } = mutation {
                if let Some(c) = next.iter_mut().find(|c| c.id == *id) {
                    fields.iter().for_each(|f| f.apply_to(c));
                }
            }
        }
        next
    }

    #[test]
    fn test_reorder_moves_to_final_position() {
        let seq = vec!['A', 'B', 'C'];
        assert_eq!(reorder(&seq, 0, 2).unwrap(), vec!['B', 'C', 'A']);
        assert_eq!(reorder(&seq, 2, 0).unwrap(), vec!['C', 'A', 'B']);
        assert_eq!(reorder(&seq, 0, 3).unwrap(), vec!['B', 'C', 'A']);
        assert_eq!(reorder(&seq, 1, 1).unwrap(), seq);
        assert!(reorder(&seq, 3, 0).is_none());
    }

    #[test]
    fn test_plan_within_only_touches_changed_orders() {
        let pool = vec![counter(1, 0, None), counter(2, 1, None), counter(3, 2, None)];
        let plan = plan_move_within(&pool, 1, 2).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan_move_within(&pool, 1, 1).unwrap().is_empty());
    }

    #[test]
    fn test_plan_within_repairs_gaps() {
        let pool = vec![counter(1, 3, None), counter(2, 7, None)];
        let plan = plan_move_within(&pool, 0, 0).unwrap();
        let after = apply(&pool, &plan);
        assert!(check_contiguous(&after).is_ok());
    }

    #[test]
    fn test_plan_across_sets_foreign_key() {
        let a = counter(1, 0, None);
        let pool = vec![a.clone(), counter(2, 1, None)];
        let x = vec![counter(3, 0, Some(9))];
        let plan = plan_move_across(&a, &pool, Container::Collection(CollectionId(9)), &x, 0);

        let everything = apply(&[pool.clone(), x.clone()].concat(), &plan);
        let new_pool = container_members(&everything, Container::Pool);
        let new_x = container_members(&everything, Container::Collection(CollectionId(9)));
        assert_eq!(new_pool.iter().map(|c| c.id.0).collect::<Vec<_>>(), vec![2]);
        assert_eq!(new_x.iter().map(|c| c.id.0).collect::<Vec<_>>(), vec![1, 3]);
        assert!(check_contiguous(&new_pool).is_ok());
        assert!(check_contiguous(&new_x).is_ok());
    }

    #[test]
    fn test_self_drop_detection() {
        let pool = vec![counter(1, 0, None), counter(2, 1, None)];
        assert!(is_self_drop(&pool, Container::Pool, CounterId(1), Container::Pool, 0));
        assert!(is_self_drop(&pool, Container::Pool, CounterId(2), Container::Pool, 50));
        assert!(!is_self_drop(&pool, Container::Pool, CounterId(1), Container::Pool, 1));
        let other = Container::Collection(CollectionId(1));
        assert!(!is_self_drop(&pool, Container::Pool, CounterId(1), other, 0));
    }

    #[test]
    fn test_gap_to_position() {
        // [A, B, C] with A lifted: gap 2 sits between B and C
        assert_eq!(gap_to_position(Some(0), 2), Some(1));
        assert_eq!(gap_to_position(Some(0), 3), Some(2));
        assert_eq!(gap_to_position(Some(0), 0), None);
        assert_eq!(gap_to_position(Some(0), 1), None);
        // moving up is unaffected
        assert_eq!(gap_to_position(Some(2), 0), Some(0));
        assert_eq!(gap_to_position(Some(2), 3), None);
        // other container: gap and position agree
        assert_eq!(gap_to_position(None, 4), Some(4));
    }

    #[test]
    fn test_check_contiguous() {
        assert!(check_contiguous::<Counter>(&[]).is_ok());
        assert!(check_contiguous(&[counter(1, 1, None), counter(2, 0, None)]).is_ok());
        assert!(check_contiguous(&[counter(1, 0, None), counter(2, 2, None)]).is_err());
        assert!(check_contiguous(&[counter(1, 0, None), counter(2, 0, None)]).is_err());
    }

    #[test]
    fn test_collection_removal_plan_orders_deletes_first() {
        let mut work = Collection::new(CollectionId(1), "Work");
        work.order = 0;
        let mut home = Collection::new(CollectionId(2), "Home");
        home.order = 1;
        let members = vec![counter(5, 0, Some(1))];

        let plan = plan_collection_removal(&[work, home], CollectionId(1), &members);
        assert_eq!(plan[0], Mutation::DeleteCounter(CounterId(5)));
        assert_eq!(plan[1], Mutation::DeleteCollection(CollectionId(1)));
        assert_eq!(
            plan[2],
            Mutation::collection(CollectionId(2), vec![CollectionField::Order(0)])
        );
    }
}
