use std::cell::RefCell;
use std::rc::Rc;

use common::err::CResult;
use protocol::copy_area::CopyArea;
use protocol::dispatch::Dispatcher;
use protocol::rpc::locator::LocatorForceRequest;
use protocol::transport::Transport;
use dbworkspace::ObjectForcer;

/// The `ObjectForcer` a [`crate::Session`] hands to `txn`'s commit/
/// savepoint/2pc-prepare paths: issues `locator_force` over the same
/// shared dispatcher the transaction manager itself uses, so object
/// flush and transaction RPCs ride the one multiplexed byte-stream a
/// session owns (§1, §5).
pub struct LocatorForcer<T: Transport> {
    dispatcher: Rc<RefCell<Dispatcher<T>>>,
}

impl<T: Transport> LocatorForcer<T> {
    pub fn new(dispatcher: Rc<RefCell<Dispatcher<T>>>) -> Self {
        Self { dispatcher }
    }
}

impl<T: Transport> ObjectForcer for LocatorForcer<T> {
    fn force(&mut self, area: CopyArea) -> CResult<CopyArea> {
        self.dispatcher
            .borrow_mut()
            .call(&LocatorForceRequest { copy_area: area })
    }
}
