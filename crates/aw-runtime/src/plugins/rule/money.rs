use std::collections::BTreeSet;

use aw_config::PluginSpec;
use aw_core::error::{CoreError, CoreReason, CoreResult};
use aw_core::plugin::{AlertRule, plugin_params};
use aw_core::report::RowMut;
use orion_error::prelude::*;
use serde::Deserialize;

use super::convert_micros;

const DEFAULT_MONEY_FIELD: &str = "Cost";

#[derive(Debug, Default, Deserialize)]
struct Params {
    #[serde(rename = "MoneyField")]
    money_field: Option<String>,
    #[serde(rename = "MoneyFields")]
    money_fields: Option<Vec<String>>,
}

/// Rewrites micro-amount columns as currency amounts in place.
#[derive(Debug, Clone)]
pub struct ConvertMoneyValue {
    fields: BTreeSet<String>,
}

impl ConvertMoneyValue {
    pub fn from_spec(spec: &PluginSpec) -> CoreResult<Self> {
        let params: Params = plugin_params(spec)?;
        let fields = match (params.money_field, params.money_fields) {
            (Some(_), Some(_)) => {
                return Err(CoreError::from(CoreReason::ConfigLoad).with_detail(
                    "ConvertMoneyValue: cannot have both \"MoneyField\" and \"MoneyFields\"",
                ));
            }
            (Some(field), None) => BTreeSet::from([field]),
            (None, Some(fields)) => fields.into_iter().collect(),
            (None, None) => BTreeSet::from([DEFAULT_MONEY_FIELD.to_string()]),
        };
        Ok(Self { fields })
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

impl AlertRule for ConvertMoneyValue {
    fn populate_row(&self, row: &mut RowMut<'_>) -> CoreResult<()> {
        for field in &self.fields {
            let converted = convert_micros(field, row.require(field)?)?;
            row.set(field, converted)?;
        }
        Ok(())
    }
}
