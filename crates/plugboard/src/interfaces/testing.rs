//! Configurable interface for unit tests.

use std::sync::Arc;

use plugboard_common::{AppName, HookName, PlugboardError, PlugboardResult, SnapName};

use super::{
    Fragment, Interface, Plug, SnapDeclaration, SnapInfo, Slot, plug_label_expr, slot_label_expr,
};
use crate::security::{BusNameOwnership, SecurityBackend};

/// Interface emitting one recognizable comment line per lifecycle point.
#[derive(Debug, Clone)]
pub struct TestInterface {
    name: &'static str,
    backends: Vec<SecurityBackend>,
    rejected_attr: Option<&'static str>,
    auto_connect: bool,
    classic: bool,
    failing: bool,
    bus_name: Option<&'static str>,
}

impl TestInterface {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            backends: SecurityBackend::ALL.to_vec(),
            rejected_attr: None,
            auto_connect: true,
            classic: false,
            failing: false,
            bus_name: None,
        }
    }

    pub fn only(mut self, backends: &[SecurityBackend]) -> Self {
        self.backends = backends.to_vec();
        self
    }

    pub const fn rejecting_attr(mut self, attr: &'static str) -> Self {
        self.rejected_attr = Some(attr);
        self
    }

    pub const fn manual_connect(mut self) -> Self {
        self.auto_connect = false;
        self
    }

    pub const fn widened_on_classic(mut self) -> Self {
        self.classic = true;
        self
    }

    pub const fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub const fn owning_bus_name(mut self, name: &'static str) -> Self {
        self.bus_name = Some(name);
        self
    }

    fn line(&self, backend: SecurityBackend, text: String) -> Option<Fragment> {
        self.backends
            .contains(&backend)
            .then(|| Fragment::from(format!("# {} {text}\n", self.name)))
    }
}

impl Interface for TestInterface {
    fn name(&self) -> &'static str {
        self.name
    }

    fn sanitize_plug(&self, plug: &mut Plug) -> PlugboardResult<()> {
        match self.rejected_attr {
            Some(attr) if plug.attrs.contains_key(attr) => Err(PlugboardError::validation(
                plug.snap.name.as_str(),
                "plug",
                format!("attribute {attr:?} is not allowed"),
            )),
            _ => Ok(()),
        }
    }

    fn permanent_plug_fragment(
        &self,
        plug: &Plug,
        backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(self.line(backend, format!("permanent-plug {}", plug.name)))
    }

    fn permanent_slot_fragment(
        &self,
        slot: &Slot,
        backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(self.line(backend, format!("permanent-slot {}", slot.name)))
    }

    fn connected_plug_fragment(
        &self,
        _plug: &Plug,
        slot: &Slot,
        backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        if self.failing {
            return Err(PlugboardError::Config {
                message: "fragment generator broke".to_string(),
            });
        }
        Ok(self.line(backend, format!("connected-plug peer={}", slot_label_expr(slot))))
    }

    fn connected_slot_fragment(
        &self,
        plug: &Plug,
        _slot: &Slot,
        backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(self.line(backend, format!("connected-slot peer={}", plug_label_expr(plug))))
    }

    fn classic_plug_fragment(
        &self,
        _plug: &Plug,
        _slot: &Slot,
        backend: SecurityBackend,
    ) -> Option<Fragment> {
        if !self.classic {
            return None;
        }
        self.line(backend, "classic peer=unconfined".to_string())
    }

    fn bus_name_ownership(&self, _slot: &Slot) -> Option<BusNameOwnership> {
        self.bus_name.map(BusNameOwnership::root)
    }

    fn auto_connect(&self, _plug: &Plug, _slot: &Slot) -> bool {
        self.auto_connect
    }
}

/// A providing snap with a single daemon app.
pub fn provider(name: &str) -> SnapDeclaration {
    let info =
        SnapInfo::new(SnapName::new(name).unwrap()).with_app(AppName::new("daemon").unwrap());
    SnapDeclaration::new(Arc::new(info))
}

/// A consuming snap with two apps and a hook.
pub fn consumer(name: &str) -> SnapDeclaration {
    let info = SnapInfo::new(SnapName::new(name).unwrap())
        .with_app(AppName::new("app").unwrap())
        .with_app(AppName::new("cli").unwrap())
        .with_hook(HookName::new("configure").unwrap());
    SnapDeclaration::new(Arc::new(info))
}
