//! Workspace Hooks (component E): the abstract interface the
//! Transaction Manager (`txn`) uses to flush dirty cached objects
//! before commit, invalidate caches on abort/partial-abort, and
//! translate between object handles and object identifiers (§4.5).
//!
//! Per DESIGN NOTES §9 ("cyclic references between Value and Workspace
//! Object"), cached objects live in a session-owned arena; a `Value` of
//! Object type stores an [`ObjectHandle`] index into it rather than a
//! pointer, so the workspace can be dropped (or an object decached)
//! without leaving a `Value` holding a dangling reference.

use std::collections::HashSet;
use std::fmt::Debug;

use common::err::CResult;
use protocol::copy_area::{CopyArea, CopyOperation};
use wire::Oid;

/// An index into a session's object arena (DESIGN NOTES §9). Stable for
/// the lifetime of the session; never reused while any `Value` might
/// still reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u32);

/// Reserved volume id marking a not-yet-permanent OID assigned locally
/// by the workspace (distinct from [`wire::NULL_OID`]'s `volume = -1`,
/// which means "unbound" rather than "temporary").
const TEMPORARY_OID_VOLUME: i32 = -2;

pub fn is_temporary_oid(oid: Oid) -> bool {
    oid.volume == TEMPORARY_OID_VOLUME
}

/// One cached object: its (possibly temporary) OID, owning class, and
/// packed image, plus the bookkeeping the workspace needs to decide
/// what survives an abort.
#[derive(Debug, Clone)]
pub struct CachedObject {
    pub oid: Oid,
    pub class_oid: Oid,
    pub is_real_class: bool,
    pub dirty: bool,
    pub image: Vec<u8>,
}

/// Packs the dirty set into a [`CopyArea`] and exchanges it with the
/// server, assigning permanent OIDs to any temporary ones. Implemented
/// against `protocol::rpc::locator::LocatorForceRequest` by `dbclient`;
/// kept as a trait here so `workspace` does not need a transport
/// dependency of its own.
pub trait ObjectForcer {
    fn force(&mut self, area: CopyArea) -> CResult<CopyArea>;
}

/// §4.5's five hooks, plus `needs_flush`. `#[async_trait]` matches the
/// teacher's convention for lifecycle traits (`BinlogLifecycle`); the
/// actual I/O happens synchronously inside `ObjectForcer::force` (the
/// transport itself is blocking, per §5's single-threaded-per-session
/// model), so nothing here ever actually awaits — the trait is async
/// only so `txn`'s commit path can drive it uniformly alongside other
/// awaited steps.
#[async_trait::async_trait]
pub trait WorkspaceHooks: Debug {
    fn needs_flush(&self) -> bool;

    async fn flush_all(&mut self, forcer: &mut dyn ObjectForcer) -> CResult<()>;

    fn abort_mops(&mut self, keep_non_realclasses: bool);

    fn clear_all_hints(&mut self, retain_lock: bool);

    fn clear_query_results(&mut self, close_cursors: bool);

    fn decache_all_but_real_classes(&mut self);
}

/// Reference workspace implementation: an arena of [`CachedObject`]s
/// addressed by [`ObjectHandle`], sufficient to drive `txn`'s unit
/// tests and the cross-crate conformance scenarios. A production
/// workspace (an actual object cache backed by the application's live
/// instances) is a named collaborator per spec.md's framing of
/// peripheral concerns, not built here.
#[derive(Debug, Default)]
pub struct InMemoryWorkspace {
    objects: Vec<Option<CachedObject>>,
    lock_hints: HashSet<ObjectHandle>,
    open_cursors: usize,
    next_temp_page: i32,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new cached object (an application-side "new instance"
    /// not yet known to the server) under a freshly minted temporary
    /// OID, and returns its handle.
    pub fn insert_new(&mut self, class_oid: Oid, is_real_class: bool, image: Vec<u8>) -> ObjectHandle {
        let oid = self.mint_temporary_oid();
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(Some(CachedObject {
            oid,
            class_oid,
            is_real_class,
            dirty: true,
            image,
        }));
        handle
    }

    /// Inserts an object already known to the server under a permanent
    /// OID (e.g. the result of a fetch), initially clean.
    pub fn insert_fetched(&mut self, oid: Oid, class_oid: Oid, is_real_class: bool, image: Vec<u8>) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(Some(CachedObject {
            oid,
            class_oid,
            is_real_class,
            dirty: false,
            image,
        }));
        handle
    }

    fn mint_temporary_oid(&mut self) -> Oid {
        self.next_temp_page -= 1;
        Oid::new(TEMPORARY_OID_VOLUME, self.next_temp_page, 0)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&CachedObject> {
        self.objects.get(handle.0 as usize).and_then(|o| o.as_ref())
    }

    pub fn mark_dirty(&mut self, handle: ObjectHandle, image: Vec<u8>) {
        if let Some(Some(obj)) = self.objects.get_mut(handle.0 as usize) {
            obj.image = image;
            obj.dirty = true;
        }
    }

    pub fn handle_for_oid(&self, oid: Oid) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .position(|o| matches!(o, Some(c) if c.oid == oid))
            .map(|i| ObjectHandle(i as u32))
    }

    pub fn add_lock_hint(&mut self, handle: ObjectHandle) {
        self.lock_hints.insert(handle);
    }

    pub fn note_cursor_opened(&mut self) {
        self.open_cursors += 1;
    }

    pub fn open_cursor_count(&self) -> usize {
        self.open_cursors
    }

    fn dirty_handles(&self) -> Vec<ObjectHandle> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(i, o)| match o {
                Some(c) if c.dirty => Some(ObjectHandle(i as u32)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl WorkspaceHooks for InMemoryWorkspace {
    fn needs_flush(&self) -> bool {
        self.objects.iter().any(|o| matches!(o, Some(c) if c.dirty))
    }

    async fn flush_all(&mut self, forcer: &mut dyn ObjectForcer) -> CResult<()> {
        let dirty = self.dirty_handles();
        if dirty.is_empty() {
            return Ok(());
        }

        let class_oid = self
            .get(dirty[0])
            .map(|c| c.class_oid)
            .unwrap_or(wire::NULL_OID);
        let mut area = CopyArea::new(class_oid);
        for &handle in &dirty {
            let obj = self.get(handle).expect("dirty handle must be live");
            let op = if is_temporary_oid(obj.oid) {
                CopyOperation::Insert
            } else {
                CopyOperation::Update
            };
            area.push(op, obj.oid, obj.class_oid, &obj.image);
        }

        // `need_permanent_oid`: the server echoes back one descriptor
        // per pushed object, in the same order, with permanent OIDs
        // substituted for any temporary ones (§4.5, §8 scenario S5).
        let forced = forcer.force(area)?;
        for (handle, descriptor) in dirty.iter().zip(forced.descriptors.iter()) {
            if let Some(Some(obj)) = self.objects.get_mut(handle.0 as usize) {
                obj.oid = descriptor.oid;
                obj.dirty = false;
            }
        }
        Ok(())
    }

    fn abort_mops(&mut self, keep_non_realclasses: bool) {
        for slot in self.objects.iter_mut() {
            let keep = matches!(slot, Some(c) if keep_non_realclasses && c.is_real_class);
            if !keep {
                *slot = None;
            }
        }
    }

    fn clear_all_hints(&mut self, retain_lock: bool) {
        if !retain_lock {
            self.lock_hints.clear();
        }
    }

    fn clear_query_results(&mut self, close_cursors: bool) {
        if close_cursors {
            self.open_cursors = 0;
        }
    }

    fn decache_all_but_real_classes(&mut self) {
        for slot in self.objects.iter_mut() {
            let keep = matches!(slot, Some(c) if c.is_real_class);
            if !keep {
                *slot = None;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct StubForcer {
        next_permanent_page: i32,
    }

    impl ObjectForcer for StubForcer {
        fn force(&mut self, area: CopyArea) -> CResult<CopyArea> {
            let mut out = area.clone();
            for d in out.descriptors.iter_mut() {
                self.next_permanent_page += 1;
                d.oid = Oid::new(1, self.next_permanent_page, 0);
            }
            Ok(out)
        }
    }

    #[tokio::test]
    async fn flush_all_resolves_temporary_oids_to_permanent() {
        let mut ws = InMemoryWorkspace::new();
        let class_oid = Oid::new(1, 1, 1);
        let h1 = ws.insert_new(class_oid, true, b"obj-one".to_vec());
        let h2 = ws.insert_new(class_oid, true, b"obj-two".to_vec());
        assert!(is_temporary_oid(ws.get(h1).unwrap().oid));
        assert!(is_temporary_oid(ws.get(h2).unwrap().oid));

        let mut forcer = StubForcer { next_permanent_page: 100 };
        ws.flush_all(&mut forcer).await.unwrap();

        assert!(!is_temporary_oid(ws.get(h1).unwrap().oid));
        assert!(!is_temporary_oid(ws.get(h2).unwrap().oid));
        assert!(!ws.get(h1).unwrap().dirty);
        assert!(!ws.needs_flush());
    }

    #[tokio::test]
    async fn flush_all_is_noop_when_nothing_dirty() {
        let mut ws = InMemoryWorkspace::new();
        let mut forcer = StubForcer { next_permanent_page: 0 };
        ws.flush_all(&mut forcer).await.unwrap();
        assert!(forcer.next_permanent_page == 0);
    }

    #[test]
    fn abort_mops_can_preserve_real_classes() {
        let mut ws = InMemoryWorkspace::new();
        let class_oid = Oid::new(1, 1, 1);
        let class_handle = ws.insert_fetched(class_oid, class_oid, true, b"cls".to_vec());
        let inst_handle = ws.insert_fetched(Oid::new(1, 2, 2), class_oid, false, b"inst".to_vec());

        ws.abort_mops(true);
        assert!(ws.get(class_handle).is_some());
        assert!(ws.get(inst_handle).is_none());
    }

    #[test]
    fn decache_all_but_real_classes_always_drops_instances() {
        let mut ws = InMemoryWorkspace::new();
        let class_oid = Oid::new(1, 1, 1);
        let class_handle = ws.insert_fetched(class_oid, class_oid, true, b"cls".to_vec());
        let inst_handle = ws.insert_fetched(Oid::new(1, 2, 2), class_oid, false, b"inst".to_vec());

        ws.decache_all_but_real_classes();
        assert!(ws.get(class_handle).is_some());
        assert!(ws.get(inst_handle).is_none());
    }

    #[test]
    fn clear_all_hints_respects_retain_lock() {
        let mut ws = InMemoryWorkspace::new();
        let h = ws.insert_fetched(Oid::new(1, 1, 1), Oid::new(1, 1, 1), true, vec![]);
        ws.add_lock_hint(h);
        ws.clear_all_hints(true);
        assert_eq!(ws.lock_hints.len(), 1);
        ws.clear_all_hints(false);
        assert_eq!(ws.lock_hints.len(), 0);
    }
}
