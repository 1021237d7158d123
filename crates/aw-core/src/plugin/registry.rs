use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use aw_config::PluginSpec;
use orion_error::prelude::*;

use super::{AlertAction, AlertRule, NamedAction, PluginBuildCtx, ReportDownloader, RuleChain, RuleSlot};
use crate::error::{CoreError, CoreReason, CoreResult};

pub type DownloaderFactory =
    Arc<dyn Fn(&PluginSpec, &PluginBuildCtx) -> CoreResult<Box<dyn ReportDownloader>> + Send + Sync>;
pub type RuleFactory =
    Arc<dyn Fn(&PluginSpec, &PluginBuildCtx) -> CoreResult<Box<dyn AlertRule>> + Send + Sync>;
pub type ActionFactory =
    Arc<dyn Fn(&PluginSpec, &PluginBuildCtx) -> CoreResult<Box<dyn AlertAction>> + Send + Sync>;

// ---------------------------------------------------------------------------
// PluginKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Downloader,
    Rule,
    Action,
}

impl PluginKind {
    /// Namespace short type names are resolved against.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Downloader => "builtin.downloader",
            Self::Rule => "builtin.rule",
            Self::Action => "builtin.action",
        }
    }

    /// A name containing `.` is fully qualified and used as is.
    pub fn qualify(&self, type_name: &str) -> String {
        let type_name = type_name.trim();
        if type_name.contains('.') {
            type_name.to_string()
        } else {
            format!("{}.{}", self.namespace(), type_name)
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Downloader => "downloader",
            Self::Rule => "rule",
            Self::Action => "action",
        })
    }
}

// ---------------------------------------------------------------------------
// PluginRegistry
// ---------------------------------------------------------------------------

/// Factories keyed by fully-qualified type name, one map per extension
/// point.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    downloaders: HashMap<String, DownloaderFactory>,
    rules: HashMap<String, RuleFactory>,
    actions: HashMap<String, ActionFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a downloader. Short names land in the default namespace.
    pub fn register_downloader<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginSpec, &PluginBuildCtx) -> CoreResult<Box<dyn ReportDownloader>>
            + Send
            + Sync
            + 'static,
    {
        self.downloaders
            .insert(PluginKind::Downloader.qualify(name), Arc::new(factory));
    }

    pub fn register_rule<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginSpec, &PluginBuildCtx) -> CoreResult<Box<dyn AlertRule>> + Send + Sync + 'static,
    {
        self.rules.insert(PluginKind::Rule.qualify(name), Arc::new(factory));
    }

    pub fn register_action<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginSpec, &PluginBuildCtx) -> CoreResult<Box<dyn AlertAction>> + Send + Sync + 'static,
    {
        self.actions
            .insert(PluginKind::Action.qualify(name), Arc::new(factory));
    }

    /// Fully-qualified names of every registered plugin of `kind`, sorted.
    pub fn names(&self, kind: PluginKind) -> Vec<String> {
        let mut names: Vec<String> = match kind {
            PluginKind::Downloader => self.downloaders.keys().cloned().collect(),
            PluginKind::Rule => self.rules.keys().cloned().collect(),
            PluginKind::Action => self.actions.keys().cloned().collect(),
        };
        names.sort();
        names
    }

    pub fn build_downloader(
        &self,
        spec: &PluginSpec,
        ctx: &PluginBuildCtx,
    ) -> CoreResult<Box<dyn ReportDownloader>> {
        let name = PluginKind::Downloader.qualify(&spec.type_name);
        let factory = self
            .downloaders
            .get(&name)
            .ok_or_else(|| self.unknown(PluginKind::Downloader, &spec.type_name))?;
        factory(spec, ctx).map_err(|e| construction_failed(PluginKind::Downloader, &spec.type_name, e))
    }

    pub fn build_rule(&self, spec: &PluginSpec, ctx: &PluginBuildCtx) -> CoreResult<Box<dyn AlertRule>> {
        let name = PluginKind::Rule.qualify(&spec.type_name);
        let factory = self
            .rules
            .get(&name)
            .ok_or_else(|| self.unknown(PluginKind::Rule, &spec.type_name))?;
        factory(spec, ctx).map_err(|e| construction_failed(PluginKind::Rule, &spec.type_name, e))
    }

    pub fn build_action(&self, spec: &PluginSpec, ctx: &PluginBuildCtx) -> CoreResult<Box<dyn AlertAction>> {
        let name = PluginKind::Action.qualify(&spec.type_name);
        let factory = self
            .actions
            .get(&name)
            .ok_or_else(|| self.unknown(PluginKind::Action, &spec.type_name))?;
        factory(spec, ctx).map_err(|e| construction_failed(PluginKind::Action, &spec.type_name, e))
    }

    /// Build an alert's rule chain, keeping configured order.
    pub fn build_rule_chain(&self, specs: &[PluginSpec], ctx: &PluginBuildCtx) -> CoreResult<RuleChain> {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            rules.push(RuleSlot {
                name: spec.type_name.clone(),
                rule: Arc::from(self.build_rule(spec, ctx)?),
            });
        }
        Ok(RuleChain::new(rules))
    }

    pub fn build_actions(&self, specs: &[PluginSpec], ctx: &PluginBuildCtx) -> CoreResult<Vec<NamedAction>> {
        specs
            .iter()
            .map(|spec| {
                Ok(NamedAction {
                    name: spec.type_name.clone(),
                    action: self.build_action(spec, ctx)?,
                })
            })
            .collect()
    }

    fn kind_of(&self, type_name: &str) -> Option<PluginKind> {
        [PluginKind::Downloader, PluginKind::Rule, PluginKind::Action]
            .into_iter()
            .find(|kind| {
                let name = kind.qualify(type_name);
                match kind {
                    PluginKind::Downloader => self.downloaders.contains_key(&name),
                    PluginKind::Rule => self.rules.contains_key(&name),
                    PluginKind::Action => self.actions.contains_key(&name),
                }
            })
    }

    fn unknown(&self, wanted: PluginKind, type_name: &str) -> CoreError {
        match self.kind_of(type_name) {
            Some(actual) => CoreError::from(CoreReason::ConfigLoad).with_detail(format!(
                "{type_name:?} is registered as {actual}, expected {wanted}"
            )),
            None => CoreError::from(CoreReason::ConfigLoad).with_detail(format!(
                "unknown {wanted} type {type_name:?} (resolved as {:?})",
                wanted.qualify(type_name)
            )),
        }
    }
}

fn construction_failed(kind: PluginKind, type_name: &str, err: CoreError) -> CoreError {
    if err.reason() == &CoreReason::ConfigLoad {
        return err;
    }
    CoreError::from(CoreReason::ConfigLoad)
        .with_detail(format!("failed to construct {kind} {type_name:?}: {err}"))
}
