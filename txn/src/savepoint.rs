/// Name prefix reserved for savepoints a collaborator (e.g. a future
/// trigger engine) establishes for its own bookkeeping rather than ones
/// an application asked for. Excluded from [`SavepointList::user_visible`].
pub const SYSTEM_SAVEPOINT_PREFIX: &str = "#sys_";

/// Newest-first savepoint stack (§4.6, §8 scenario S3). Names are
/// matched case-insensitively, matching the server's own comparison;
/// `partial_abort` truncates from the newest entry through (and
/// including) the named one.
#[derive(Debug, Default, Clone)]
pub struct SavepointList {
    /// Index 0 is the most recently established savepoint.
    names: Vec<String>,
}

impl SavepointList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: String) {
        self.names.insert(0, name);
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names_newest_first(&self) -> &[String] {
        &self.names
    }

    /// Names an application asked for, newest first, with
    /// [`SYSTEM_SAVEPOINT_PREFIX`]-tagged internal savepoints filtered
    /// out — the listing `tran_savepoint`'s callers actually see.
    pub fn user_visible(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| !n.starts_with(SYSTEM_SAVEPOINT_PREFIX))
            .map(String::as_str)
            .collect()
    }

    fn position_case_insensitive(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }

    /// Drops `name` and every savepoint established after it (i.e.
    /// everything newer, which sits before it in this newest-first
    /// list). Returns the surviving tail, oldest-last, so a caller can
    /// confirm what remains.
    pub fn truncate_through(&mut self, name: &str) -> Option<Vec<String>> {
        let idx = self.position_case_insensitive(name)?;
        self.names.drain(0..=idx);
        Some(self.names.clone())
    }

    /// Whole-transaction abort/commit: every savepoint is gone.
    pub fn clear(&mut self) {
        self.names.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truncate_through_drops_named_and_everything_newer() {
        let mut sp = SavepointList::new();
        sp.push("s1".to_string());
        sp.push("s2".to_string());
        sp.push("s3".to_string());
        // newest-first: [s3, s2, s1]

        let remaining = sp.truncate_through("s2").unwrap();
        assert_eq!(remaining, vec!["s1".to_string()]);
        assert_eq!(sp.names_newest_first(), &["s1".to_string()]);
    }

    #[test]
    fn truncate_is_case_insensitive() {
        let mut sp = SavepointList::new();
        sp.push("Alpha".to_string());
        let remaining = sp.truncate_through("ALPHA").unwrap();
        assert!(remaining.is_empty());
        assert!(sp.is_empty());
    }

    #[test]
    fn truncate_unknown_name_is_none() {
        let mut sp = SavepointList::new();
        sp.push("s1".to_string());
        assert!(sp.truncate_through("nope").is_none());
        assert_eq!(sp.names_newest_first().len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut sp = SavepointList::new();
        sp.push("s1".to_string());
        sp.push("s2".to_string());
        sp.clear();
        assert!(sp.is_empty());
    }

    #[test]
    fn user_visible_excludes_system_savepoints() {
        let mut sp = SavepointList::new();
        sp.push("s1".to_string());
        sp.push(format!("{}cascade_delete", SYSTEM_SAVEPOINT_PREFIX));
        sp.push("s2".to_string());

        assert_eq!(sp.user_visible(), vec!["s2", "s1"]);
        assert_eq!(sp.names_newest_first().len(), 3, "the internal entry still participates in truncation");
    }
}
