//! Built-in downloaders, rules and actions.

pub mod action;
pub mod downloader;
pub mod rule;

use aw_core::plugin::PluginRegistry;

use action::{PerAccountManagerEmailSender, SimpleConsoleWriter, SimpleLogFileWriter};
use downloader::{AwqlReportDownloader, NoOpAlertReportDownloader, TableReportDownloader};
use rule::{AddAccountManager, AddAccountMonthlyBudget, ConvertMoneyValue};

/// Register every built-in plugin under its short name.
pub fn register_builtins(registry: &mut PluginRegistry) {
    registry.register_downloader("AwqlReportDownloader", |spec, ctx| {
        Ok(Box::new(AwqlReportDownloader::from_spec(spec, ctx)?))
    });
    registry.register_downloader("NoOpAlertReportDownloader", |_, _| {
        Ok(Box::new(NoOpAlertReportDownloader))
    });
    registry.register_downloader("TableReportDownloader", |spec, ctx| {
        Ok(Box::new(TableReportDownloader::from_spec(spec, ctx)?))
    });

    registry.register_rule("AddAccountManager", |spec, _| {
        Ok(Box::new(AddAccountManager::from_spec(spec)?))
    });
    registry.register_rule("AddAccountMonthlyBudget", |spec, _| {
        Ok(Box::new(AddAccountMonthlyBudget::from_spec(spec)?))
    });
    registry.register_rule("ConvertMoneyValue", |spec, _| {
        Ok(Box::new(ConvertMoneyValue::from_spec(spec)?))
    });

    registry.register_action("SimpleConsoleWriter", |_, _| {
        Ok(Box::new(SimpleConsoleWriter::stdout()))
    });
    registry.register_action("SimpleLogFileWriter", |spec, ctx| {
        Ok(Box::new(SimpleLogFileWriter::from_spec(spec, ctx)?))
    });
    registry.register_action("PerAccountManagerEmailSender", |spec, _| {
        Ok(Box::new(PerAccountManagerEmailSender::from_spec(spec)?))
    });
}

/// A registry holding the built-in plugins.
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    register_builtins(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use aw_core::plugin::PluginKind;

    use super::*;

    #[test]
    fn builtins_live_in_default_namespaces() {
        let registry = builtin_registry();
        assert_eq!(
            registry.names(PluginKind::Downloader),
            vec![
                "builtin.downloader.AwqlReportDownloader",
                "builtin.downloader.NoOpAlertReportDownloader",
                "builtin.downloader.TableReportDownloader"
            ]
        );
        assert_eq!(registry.names(PluginKind::Rule).len(), 3);
        assert!(registry
            .names(PluginKind::Action)
            .contains(&"builtin.action.PerAccountManagerEmailSender".to_string()));
    }
}
