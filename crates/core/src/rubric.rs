//! Pure set computations shared by delivery and allocation.
//!
//! Hidden-page indices in a rubric are zero-based positions into the
//! extracted page sequence. Splitting visible from hidden happens here so
//! both the delivery handler and its tests agree on the semantics.

/// Split a slice of page-like items into (visible, hidden) by position.
///
/// `hidden` holds zero-based indices; out-of-range indices are ignored.
pub fn partition_hidden<T: Clone>(items: &[T], hidden: &[i32]) -> (Vec<T>, Vec<T>) {
    let mut visible = Vec::with_capacity(items.len());
    let mut concealed = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if hidden.contains(&(index as i32)) {
            concealed.push(item.clone());
        } else {
            visible.push(item.clone());
        }
    }
    (visible, concealed)
}

/// Booklet names present in the accepted directory but not yet referenced
/// by any work item, preserving the (sorted) directory order.
pub fn unassigned_booklets(all: &[String], assigned: &[String]) -> Vec<String> {
    all.iter()
        .filter(|name| !assigned.contains(name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_separates_hidden_positions() {
        let pages = vec!["p1", "p2", "p3", "p4"];
        let (visible, hidden) = partition_hidden(&pages, &[1, 3]);
        assert_eq!(visible, vec!["p1", "p3"]);
        assert_eq!(hidden, vec!["p2", "p4"]);
    }

    #[test]
    fn partition_ignores_out_of_range_indices() {
        let pages = vec!["p1", "p2"];
        let (visible, hidden) = partition_hidden(&pages, &[5, -1]);
        assert_eq!(visible, vec!["p1", "p2"]);
        assert!(hidden.is_empty());
    }

    #[test]
    fn partition_with_no_hidden_keeps_everything() {
        let pages = vec![1, 2, 3];
        let (visible, hidden) = partition_hidden(&pages, &[]);
        assert_eq!(visible, vec![1, 2, 3]);
        assert!(hidden.is_empty());
    }

    #[test]
    fn unassigned_is_stable_set_difference() {
        let all = vec!["a.pdf".to_string(), "b.pdf".to_string(), "c.pdf".to_string()];
        let assigned = vec!["b.pdf".to_string()];
        assert_eq!(
            unassigned_booklets(&all, &assigned),
            vec!["a.pdf".to_string(), "c.pdf".to_string()]
        );
    }

    #[test]
    fn fully_assigned_pool_is_empty() {
        let all = vec!["a.pdf".to_string()];
        let assigned = vec!["a.pdf".to_string(), "stale.pdf".to_string()];
        assert!(unassigned_booklets(&all, &assigned).is_empty());
    }
}
