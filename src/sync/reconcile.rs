use crate::models::ContractRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Unchanged,
    Replaced(Vec<ContractRecord>),
}

/// Decide what the local record set becomes after a successful fetch.
///
/// Current policy is last-writer-wins on the whole collection: if the remote
/// list differs from the local one in any way (compared by serialized form),
/// it replaces the local list wholesale. No per-record merge happens, so a
/// local edit that has not reached the sheet yet is lost here.
pub fn reconcile(local: &[ContractRecord], remote: Vec<ContractRecord>) -> Reconciliation {
    let same = match (serde_json::to_string(local), serde_json::to_string(&remote)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };

    if same {
        Reconciliation::Unchanged
    } else {
        Reconciliation::Replaced(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, amount: f64) -> ContractRecord {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Plot {}", id),
            "amount": amount,
            "ownerName": "Owner",
            "duration": "1 বছর",
            "startDate": "2024-01-01"
        }))
        .unwrap()
    }

    #[test]
    fn test_identical_sets_are_unchanged() {
        let local = vec![record("1", 100.0), record("2", 200.0)];
        let remote = local.clone();
        assert_eq!(reconcile(&local, remote), Reconciliation::Unchanged);
    }

    #[test]
    fn test_any_difference_replaces_everything() {
        let local = vec![record("1", 100.0), record("2", 200.0)];
        let remote = vec![record("1", 150.0)];
        assert_eq!(
            reconcile(&local, remote.clone()),
            Reconciliation::Replaced(remote)
        );
    }

    #[test]
    fn test_reordering_counts_as_difference() {
        let local = vec![record("1", 100.0), record("2", 200.0)];
        let remote = vec![record("2", 200.0), record("1", 100.0)];
        assert!(matches!(reconcile(&local, remote), Reconciliation::Replaced(_)));
    }

    #[test]
    fn test_empty_remote_wipes_local() {
        let local = vec![record("1", 100.0)];
        assert_eq!(
            reconcile(&local, Vec::new()),
            Reconciliation::Replaced(Vec::new())
        );
    }
}
