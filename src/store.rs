/// Persisted dashboard: the user's gauge list and theme preference.
///
/// Stored as JSON in the same shape the gauge list has always used
/// (`{id, name, displayName, unit, maxFlow, minFlow, isCustom?,
/// customConfig?}`), so existing lists load unchanged. The store is loaded
/// once at startup and saved after every change; computed readings are
/// never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::{CustomGaugeExpression, GaugeError, Operand, Operator, OperatorStep, Unit};

// ---------------------------------------------------------------------------
// Custom gauge configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandType {
    Number,
    Gauge,
}

/// One step of a custom gauge as saved by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOperation {
    pub operator: Operator,
    pub operand_type: OperandType,
    /// Number or numeric text; only read for `Number` operands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauge_name: Option<String>,
}

impl CustomOperation {
    pub fn number(operator: Operator, value: f64) -> Self {
        Self {
            operator,
            operand_type: OperandType::Number,
            operand_value: serde_json::Number::from_f64(value).map(serde_json::Value::Number),
            gauge: None,
            gauge_name: None,
        }
    }

    pub fn gauge(operator: Operator, gauge_id: &str, gauge_name: Option<&str>) -> Self {
        Self {
            operator,
            operand_type: OperandType::Gauge,
            operand_value: None,
            gauge: Some(gauge_id.to_string()),
            gauge_name: gauge_name.map(str::to_string),
        }
    }

    /// Converts to an evaluator step. Values that are not usable numbers,
    /// and gauge steps with no gauge selected, become `Operand::Unparsed`.
    pub fn to_step(&self) -> OperatorStep {
        let operand = match self.operand_type {
            OperandType::Number => match &self.operand_value {
                Some(serde_json::Value::Number(n)) => match n.as_f64() {
                    Some(v) if v.is_finite() => Operand::Scalar(v),
                    _ => Operand::Unparsed(n.to_string()),
                },
                Some(serde_json::Value::String(s)) => Operand::parse_scalar(s),
                Some(other) => Operand::Unparsed(other.to_string()),
                None => Operand::Unparsed(String::new()),
            },
            OperandType::Gauge => match self.gauge.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => Operand::Gauge(id.to_string()),
                _ => Operand::Unparsed(String::new()),
            },
        };

        OperatorStep {
            operator: self.operator,
            operand,
        }
    }

    fn describe(&self) -> Option<String> {
        let operand = match self.operand_type {
            OperandType::Number => match self.operand_value.as_ref()? {
                serde_json::Value::String(s) if s.is_empty() => return None,
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => match n.as_f64() {
                    Some(v) => v.to_string(),
                    None => n.to_string(),
                },
                other => other.to_string(),
            },
            OperandType::Gauge => self
                .gauge_name
                .clone()
                .filter(|n| !n.is_empty())
                .or_else(|| self.gauge.clone())?,
        };
        Some(format!("{} {}", self.operator, operand))
    }
}

/// A custom gauge: base gauge plus a left-to-right operator chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConfig {
    pub base_gauge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_gauge_name: Option<String>,
    #[serde(default)]
    pub operations: Vec<CustomOperation>,
}

impl CustomConfig {
    pub fn to_expression(&self) -> CustomGaugeExpression {
        CustomGaugeExpression {
            base_gauge_id: self.base_gauge.clone(),
            steps: self.operations.iter().map(CustomOperation::to_step).collect(),
        }
    }

    /// First step whose operand cannot be evaluated, as
    /// `GaugeError::InvalidOperand` with a 1-based step number.
    pub fn validate(&self) -> Result<(), GaugeError> {
        for (index, op) in self.operations.iter().enumerate() {
            if let Operand::Unparsed(value) = op.to_step().operand {
                return Err(GaugeError::InvalidOperand { step: index + 1, value });
            }
        }
        Ok(())
    }

    /// Name derived from the chain, e.g. `"Fox River + 100 * Des Plaines"`.
    pub fn auto_name(&self) -> String {
        let base = self
            .base_gauge_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.base_gauge);

        self.operations
            .iter()
            .filter_map(CustomOperation::describe)
            .fold(base.to_string(), |mut name, step| {
                name.push(' ');
                name.push_str(&step);
                name
            })
    }

    /// Every gauge id the expression reads, base first.
    pub fn gauge_ids(&self) -> Vec<&str> {
        std::iter::once(self.base_gauge.as_str())
            .chain(self.operations.iter().filter_map(|op| match op.operand_type {
                OperandType::Gauge => op.gauge.as_deref(),
                OperandType::Number => None,
            }))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Gauge configuration
// ---------------------------------------------------------------------------

/// One tracked gauge as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub max_flow: Option<f64>,
    #[serde(default)]
    pub min_flow: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<CustomConfig>,
}

impl GaugeConfig {
    /// A plain USGS gauge.
    pub fn plain(id: &str, name: Option<&str>, unit: Unit) -> Self {
        Self {
            id: id.to_string(),
            name: name.map(str::to_string),
            display_name: name.map(str::to_string),
            unit,
            max_flow: None,
            min_flow: None,
            is_custom: false,
            custom_config: None,
        }
    }

    /// A custom gauge. The id is `custom-<millis>`; the display name falls
    /// back to the chain's auto name.
    pub fn custom(
        config: CustomConfig,
        unit: Unit,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| config.auto_name());

        Self {
            id: format!("custom-{}", now.timestamp_millis()),
            name: Some(name.clone()),
            display_name: Some(name),
            unit,
            max_flow: None,
            min_flow: None,
            is_custom: true,
            custom_config: Some(config),
        }
    }

    pub fn with_range(mut self, min_flow: Option<f64>, max_flow: Option<f64>) -> Self {
        self.min_flow = min_flow;
        self.max_flow = max_flow;
        self
    }

    /// Name shown to the user: display name, then source name, then id.
    pub fn label(&self) -> &str {
        [self.display_name.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }

    /// The custom expression, if this is a custom gauge with a saved chain.
    pub fn expression(&self) -> Option<CustomGaugeExpression> {
        if !self.is_custom {
            return None;
        }
        self.custom_config.as_ref().map(CustomConfig::to_expression)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// The ordered gauge list plus UI preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dashboard {
    pub gauges: Vec<GaugeConfig>,
    pub theme: Theme,
    /// Saved entries that no longer deserialize, kept verbatim and written
    /// back on save.
    #[serde(skip)]
    unreadable: Vec<serde_json::Value>,
}

/// Changes applied by `Dashboard::update`. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaugeEdit {
    /// An empty name clears the display name.
    pub display_name: Option<String>,
    pub unit: Option<Unit>,
    pub min_flow: Option<Option<f64>>,
    pub max_flow: Option<Option<f64>>,
    /// Only accepted for custom gauges.
    pub custom_config: Option<CustomConfig>,
}

impl Dashboard {
    pub fn find(&self, id: &str) -> Option<&GaugeConfig> {
        self.gauges.iter().find(|g| g.id == id)
    }

    /// Appends a gauge. Each id may appear once.
    pub fn add(&mut self, gauge: GaugeConfig) -> Result<(), GaugeError> {
        if self.find(&gauge.id).is_some() {
            return Err(GaugeError::Config(format!(
                "gauge {} is already on the dashboard",
                gauge.id
            )));
        }
        self.gauges.push(gauge);
        Ok(())
    }

    /// Edits a gauge in place, keeping its id and position.
    ///
    /// Returns `true` when the unit or the custom chain changed, i.e. the
    /// gauge's reading has to be fetched again.
    ///
    /// # Errors
    /// `GaugeError::Config` for an unknown id, or a custom chain given for
    /// a plain gauge. The gauge is left untouched in both cases.
    pub fn update(&mut self, id: &str, edit: GaugeEdit) -> Result<bool, GaugeError> {
        let gauge = self
            .gauges
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| GaugeError::Config(format!("no gauge {} on the dashboard", id)))?;

        if edit.custom_config.is_some() && !gauge.is_custom {
            return Err(GaugeError::Config(format!("gauge {} is not a custom gauge", id)));
        }

        if let Some(name) = edit.display_name {
            let name = name.trim();
            gauge.display_name = (!name.is_empty()).then(|| name.to_string());
        }
        if let Some(min_flow) = edit.min_flow {
            gauge.min_flow = min_flow;
        }
        if let Some(max_flow) = edit.max_flow {
            gauge.max_flow = max_flow;
        }

        let mut refetch = false;
        if let Some(unit) = edit.unit {
            refetch |= unit != gauge.unit;
            gauge.unit = unit;
        }
        if let Some(config) = edit.custom_config {
            refetch |= gauge.custom_config.as_ref() != Some(&config);
            gauge.custom_config = Some(config);
        }

        Ok(refetch)
    }

    /// Removes a gauge, returning whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.gauges.len();
        self.gauges.retain(|g| g.id != id);
        self.gauges.len() != before
    }

    /// Moves a gauge to `position` (clamped to the end of the list).
    pub fn move_to(&mut self, id: &str, position: usize) -> bool {
        let Some(from) = self.gauges.iter().position(|g| g.id == id) else {
            return false;
        };
        let gauge = self.gauges.remove(from);
        let to = position.min(self.gauges.len());
        self.gauges.insert(to, gauge);
        true
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Number of saved entries that could not be read.
    pub fn unreadable_count(&self) -> usize {
        self.unreadable.len()
    }
}

/// Loads and saves a `Dashboard` at a fixed path.
pub struct DashboardStore {
    path: PathBuf,
}

impl DashboardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the dashboard. A missing or blank file is an empty dashboard.
    ///
    /// # Errors
    /// - `GaugeError::Io`: the file exists but cannot be read.
    /// - `GaugeError::Parse`: the file is not a dashboard at all. Callers
    ///   must not save over it.
    pub fn load(&self) -> Result<Dashboard, GaugeError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no dashboard at {}", self.path.display());
                return Ok(Dashboard::default());
            }
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Dashboard::default());
        }

        let dashboard = parse_dashboard(&contents).map_err(|e| match e {
            GaugeError::Parse(msg) => {
                GaugeError::Parse(format!("{} ({})", msg, self.path.display()))
            }
            other => other,
        })?;
        if dashboard.unreadable_count() > 0 {
            log::warn!(
                "{} saved gauge(s) in {} could not be read and are kept as is",
                dashboard.unreadable_count(),
                self.path.display()
            );
        }
        Ok(dashboard)
    }

    /// Writes the dashboard as pretty JSON, creating parent directories.
    /// Unreadable entries from the last load are appended unchanged.
    pub fn save(&self, dashboard: &Dashboard) -> Result<(), GaugeError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut value = serde_json::to_value(dashboard)
            .map_err(|e| GaugeError::Config(format!("serializing dashboard: {}", e)))?;
        if let Some(serde_json::Value::Array(gauges)) = value.get_mut("gauges") {
            gauges.extend(dashboard.unreadable.iter().cloned());
        }
        let json = serde_json::to_string_pretty(&value)
            .map_err(|e| GaugeError::Config(format!("serializing dashboard: {}", e)))?;
        fs::write(&self.path, json)?;
        log::debug!("saved {} gauges to {}", dashboard.gauges.len(), self.path.display());
        Ok(())
    }
}

/// Accepts either a full dashboard object or a bare gauge array.
///
/// Entries are read one at a time: an entry that does not deserialize is
/// logged, set aside and kept for the next save. An unknown theme falls
/// back to the default.
pub fn parse_dashboard(json: &str) -> Result<Dashboard, GaugeError> {
    use serde_json::Value;

    let value: Value =
        serde_json::from_str(json).map_err(|e| GaugeError::Parse(format!("dashboard: {}", e)))?;

    let (entries, theme) = match value {
        Value::Array(entries) => (entries, None),
        Value::Object(mut fields) => {
            let entries = match fields.remove("gauges") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(GaugeError::Parse("dashboard: `gauges` is not a list".to_string()));
                }
            };
            (entries, fields.remove("theme"))
        }
        _ => {
            return Err(GaugeError::Parse(
                "dashboard: expected an object or a gauge list".to_string(),
            ));
        }
    };

    let theme = match theme {
        None | Some(Value::Null) => Theme::default(),
        Some(raw) => serde_json::from_value(raw).unwrap_or_else(|e| {
            log::warn!("unknown dashboard theme, using the default: {}", e);
            Theme::default()
        }),
    };

    let mut dashboard = Dashboard {
        theme,
        ..Dashboard::default()
    };
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<GaugeConfig>(entry.clone()) {
            Ok(gauge) => dashboard.gauges.push(gauge),
            Err(e) => {
                log::warn!("skipping saved gauge {}: {}", index + 1, e);
                dashboard.unreadable.push(entry);
            }
        }
    }
    Ok(dashboard)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
