//! Per-key views over the raw bundle.
//!
//! Four keys get a flattened, filterable list; every other key passes
//! through untouched. Each shape is described by a static `ShapeSpec` row and
//! runs through the same extract, filter, project pipeline.

use std::fmt;

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::query::QueryParams;
use crate::value::{
    bool_field, contains_ignore_case, eq_ignore_case, field_or_null, key_list, object_field,
    opt_str_field, str_field, type_name, Record,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Groups,
    Platforms,
    Domains,
    Hosts,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Groups, Shape::Platforms, Shape::Domains, Shape::Hosts];

    pub fn for_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.key() == key)
    }

    /// Root key in the bundle that carries this shape.
    pub const fn key(self) -> &'static str {
        match self {
            Shape::Groups => "/v1/group",
            Shape::Platforms => "/v1/scan/platform",
            Shape::Domains => "/v1/domain",
            Shape::Hosts => "/v1/host",
        }
    }

    pub const fn noun(self) -> &'static str {
        match self {
            Shape::Groups => "group",
            Shape::Platforms => "platform",
            Shape::Domains => "domain",
            Shape::Hosts => "host",
        }
    }

    fn spec(self) -> &'static ShapeSpec {
        match self {
            Shape::Groups => &GROUPS,
            Shape::Platforms => &PLATFORMS,
            Shape::Domains => &DOMAINS,
            Shape::Hosts => &HOSTS,
        }
    }

    /// Extracts, filters and projects the shape's array. Records come back
    /// in source order.
    pub fn project(self, value: &Value, params: &QueryParams) -> Result<Vec<Value>> {
        let spec = self.spec();
        let elements = self.elements(value)?;
        let filters: Vec<&Filter> = spec
            .filters
            .iter()
            .filter(|filter| filter.is_active(params))
            .collect();

        let mut records = Vec::new();
        for element in elements {
            let Some(record) = element.as_object() else {
                if spec.strict_elements {
                    return Err(self.mismatch(format!(
                        "expected '{}' elements to be objects, got {}",
                        spec.array_field,
                        type_name(element)
                    )));
                }
                log::debug!(
                    "Skipping non-object {} entry ({})",
                    self.noun(),
                    type_name(element)
                );
                continue;
            };

            if spec.hide_internal && str_field(record, "name").starts_with('_') {
                continue;
            }
            if !filters.iter().all(|filter| filter.keeps(record, params)) {
                continue;
            }
            records.push(spec.projection.apply(record));
        }
        Ok(records)
    }

    fn elements<'a>(self, value: &'a Value) -> Result<&'a Vec<Value>> {
        let field = self.spec().array_field;
        let Some(object) = value.as_object() else {
            return Err(self.mismatch(format!(
                "expected '{}' data to be an object, got {}",
                self.key(),
                type_name(value)
            )));
        };
        let Some(inner) = object.get(field) else {
            return Err(self.mismatch(format!(
                "'{}' data has no '{field}' key. Keys found: [{}]",
                self.key(),
                key_list(object)
            )));
        };
        inner.as_array().ok_or_else(|| {
            self.mismatch(format!(
                "expected '{field}' to be an array, got {}",
                type_name(inner)
            ))
        })
    }

    fn mismatch(self, reason: String) -> StoreError {
        log::error!("Cannot build {} view: {reason}", self.noun());
        StoreError::mismatch(self, reason)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Dispatches on the literal key: recognized shapes are projected, anything
/// else is returned as-is regardless of `params`.
pub fn project(key: &str, value: &Value, params: &QueryParams) -> Result<Value> {
    match Shape::for_key(key) {
        Some(shape) => shape.project(value, params).map(Value::Array),
        None => Ok(value.clone()),
    }
}

struct ShapeSpec {
    array_field: &'static str,
    /// Drop records whose `name` starts with `_`.
    hide_internal: bool,
    /// Fail on non-object elements instead of skipping them.
    strict_elements: bool,
    filters: &'static [Filter],
    projection: Projection,
}

/// A predicate over one record, active only when its query parameter is set.
enum Filter {
    /// `"true"` keeps records with the flag set, `"false"` keeps the rest.
    Flag {
        param: &'static str,
        field: &'static str,
    },
    Contains {
        param: &'static str,
        field: &'static str,
    },
    Equals {
        param: &'static str,
        field: &'static str,
    },
}

impl Filter {
    fn param(&self) -> &'static str {
        match self {
            Filter::Flag { param, .. }
            | Filter::Contains { param, .. }
            | Filter::Equals { param, .. } => *param,
        }
    }

    fn is_active(&self, params: &QueryParams) -> bool {
        !params.get(self.param()).is_empty()
    }

    fn keeps(&self, record: &Record, params: &QueryParams) -> bool {
        let wanted = params.get(self.param());
        match self {
            Filter::Flag { field, .. } => match wanted {
                "true" => bool_field(record, field),
                "false" => !bool_field(record, field),
                _ => true,
            },
            Filter::Contains { field, .. } => contains_ignore_case(str_field(record, field), wanted),
            Filter::Equals { field, .. } => eq_ignore_case(str_field(record, field), wanted),
        }
    }
}

type Derive = fn(&Record) -> Value;

enum Projection {
    /// Emit the element unchanged.
    Whole,
    Flatten {
        fields: &'static [&'static str],
        derived: &'static [(&'static str, Derive)],
        /// `(output, source)` pairs lifted from a nested `scan_summary` object,
        /// emitted only when that object exists.
        summary: &'static [(&'static str, &'static str)],
    },
}

impl Projection {
    fn apply(&self, record: &Record) -> Value {
        match self {
            Projection::Whole => Value::Object(record.clone()),
            Projection::Flatten {
                fields,
                derived,
                summary,
            } => {
                let mut out = Record::new();
                for field in *fields {
                    out.insert((*field).to_string(), field_or_null(record, field));
                }
                for (name, derive) in *derived {
                    out.insert((*name).to_string(), derive(record));
                }
                if let Some(scan) = object_field(record, "scan_summary") {
                    for (name, source) in *summary {
                        out.insert((*name).to_string(), field_or_null(scan, source));
                    }
                }
                Value::Object(out)
            }
        }
    }
}

const SCAN_COUNTS: [(&str, &str); 3] = [
    ("high", "high"),
    ("medium", "medium"),
    ("scanned_at", "scanned_at"),
];

static GROUPS: ShapeSpec = ShapeSpec {
    array_field: "groups",
    hide_internal: true,
    strict_elements: true,
    filters: &[
        Filter::Flag {
            param: "zero_drift",
            field: "zero_drift_enabled",
        },
        Filter::Contains {
            param: "domain",
            field: "domain",
        },
        Filter::Equals {
            param: "policy_mode",
            field: "policy_mode",
        },
    ],
    projection: Projection::Whole,
};

static PLATFORMS: ShapeSpec = ShapeSpec {
    array_field: "platforms",
    hide_internal: false,
    strict_elements: false,
    filters: &[],
    projection: Projection::Flatten {
        fields: &["platform", "status"],
        derived: &[("version", platform_version as Derive)],
        summary: &SCAN_COUNTS,
    },
};

static DOMAINS: ShapeSpec = ShapeSpec {
    array_field: "domains",
    hide_internal: true,
    strict_elements: false,
    filters: &[Filter::Contains {
        param: "domain",
        field: "name",
    }],
    projection: Projection::Flatten {
        fields: &[
            "name",
            "workloads",
            "running_workloads",
            "running_pods",
            "services",
        ],
        derived: &[],
        summary: &[],
    },
};

// Hosts keep `_`-prefixed names, unlike groups and domains.
static HOSTS: ShapeSpec = ShapeSpec {
    array_field: "hosts",
    hide_internal: false,
    strict_elements: false,
    filters: &[Filter::Contains {
        param: "domain",
        field: "name",
    }],
    projection: Projection::Flatten {
        fields: &["name", "state", "os", "platform", "containers"],
        derived: &[],
        summary: &[
            ("scan_status", "status"),
            ("high", "high"),
            ("medium", "medium"),
            ("scanned_at", "scanned_at"),
        ],
    },
};

/// OpenShift platforms report `openshift_version`, others `kube_version`;
/// a record without a platform name falls back to a plain `version`.
fn platform_version(record: &Record) -> Value {
    let version = match opt_str_field(record, "platform") {
        Some(name) if contains_ignore_case(name, "openshift") => {
            str_field(record, "openshift_version")
        }
        Some(_) => str_field(record, "kube_version"),
        None => str_field(record, "version"),
    };
    Value::String(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn names(records: &Value) -> Vec<&str> {
        records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect()
    }

    fn groups() -> Value {
        json!({"groups": [
            {"name": "g1", "domain": "prod", "policy_mode": "Monitor", "zero_drift_enabled": true},
            {"name": "g2", "domain": "Production", "policy_mode": "Protect"},
            {"name": "g3", "domain": "staging", "policy_mode": "monitor", "zero_drift_enabled": false},
            {"name": "g4"},
            {"name": "_sys", "domain": "prod", "policy_mode": "Monitor", "zero_drift_enabled": true}
        ]})
    }

    fn group_names(params: &QueryParams) -> Vec<String> {
        let out = project("/v1/group", &groups(), params).unwrap();
        names(&out).into_iter().map(str::to_string).collect()
    }

    #[test]
    fn unknown_keys_pass_through_regardless_of_params() {
        let value = json!({"groups": [{"name": "_hidden"}], "n": [1, 2]});
        let params = QueryParams::new().with("domain", "x").with("zero_drift", "true");
        assert_eq!(project("/v1/other", &value, &params).unwrap(), value);
        assert_eq!(project("/v1/group/", &value, &params).unwrap(), value);
        assert_eq!(project("v1/group", &json!("s"), &QueryParams::new()).unwrap(), json!("s"));
    }

    #[test]
    fn groups_are_emitted_whole_and_in_order() {
        let out = project("/v1/group", &groups(), &QueryParams::new()).unwrap();
        assert_eq!(names(&out), vec!["g1", "g2", "g3", "g4"]);
        assert_eq!(out[0], groups()["groups"][0]);
    }

    #[test]
    fn group_zero_drift_filter() {
        let on = QueryParams::new().with("zero_drift", "true");
        let off = QueryParams::new().with("zero_drift", "false");
        let other = QueryParams::new().with("zero_drift", "maybe");
        assert_eq!(group_names(&on), vec!["g1"]);
        assert_eq!(group_names(&off), vec!["g2", "g3", "g4"]);
        assert_eq!(group_names(&other), vec!["g1", "g2", "g3", "g4"]);
    }

    #[test]
    fn group_domain_filter_is_case_insensitive_substring() {
        let params = QueryParams::new().with("domain", "PROD");
        assert_eq!(group_names(&params), vec!["g1", "g2"]);
    }

    #[test]
    fn group_policy_mode_filter_is_exact() {
        let exact = QueryParams::new().with("policy_mode", "Monitor");
        let upper = QueryParams::new().with("policy_mode", "MONITOR");
        let longer = QueryParams::new().with("policy_mode", "monitoring");
        assert_eq!(group_names(&exact), vec!["g1", "g3"]);
        assert_eq!(group_names(&upper), vec!["g1", "g3"]);
        assert!(group_names(&longer).is_empty());
        assert!(group_names(&QueryParams::new().with("policy_mode", "mon")).is_empty());
    }

    #[test]
    fn adding_group_filters_never_grows_the_result() {
        let base = QueryParams::new().with("domain", "prod");
        let narrowed = base.clone().with("zero_drift", "true");
        let wide = group_names(&base);
        let narrow = group_names(&narrowed);
        assert!(narrow.iter().all(|name| wide.contains(name)));
        assert!(narrow.len() <= wide.len());
    }

    #[test]
    fn underscore_groups_never_appear() {
        for params in [
            QueryParams::new(),
            QueryParams::new().with("domain", "prod"),
            QueryParams::new().with("zero_drift", "true"),
            QueryParams::new().with("policy_mode", "monitor"),
        ] {
            assert!(!group_names(&params).iter().any(|n| n.starts_with('_')));
        }
    }

    #[test]
    fn group_scenario_from_bundle() {
        let value = json!({"groups": [
            {"name": "g1", "domain": "prod", "policy_mode": "Monitor"},
            {"name": "_sys", "domain": "prod"}
        ]});
        let params = QueryParams::new().with("domain", "prod");
        assert_eq!(
            project("/v1/group", &value, &params).unwrap(),
            json!([{"name": "g1", "domain": "prod", "policy_mode": "Monitor"}])
        );
    }

    #[test]
    fn malformed_groups_are_errors() {
        for value in [
            json!([1, 2]),
            json!({"other": []}),
            json!({"groups": "nope"}),
            json!({"groups": [{"name": "ok"}, 3]}),
        ] {
            let err = project("/v1/group", &value, &QueryParams::new()).unwrap_err();
            assert!(
                matches!(err, StoreError::ShapeMismatch { shape: Shape::Groups, .. }),
                "{value}"
            );
            assert_eq!(err.to_string(), "Failed to process group data.");
        }
    }

    #[test]
    fn empty_after_filtering_is_not_an_error() {
        let params = QueryParams::new().with("domain", "nowhere");
        assert_eq!(project("/v1/group", &groups(), &params).unwrap(), json!([]));
    }

    #[test]
    fn platforms_pick_version_by_platform_name() {
        let value = json!({"platforms": [
            {"platform": "OpenShift", "status": "ok", "openshift_version": "4.12", "kube_version": "1.25",
             "scan_summary": {"high": 3, "medium": 5, "scanned_at": "2025-07-26T18:41:36Z", "status": "finished"}},
            {"platform": "Kubernetes", "status": "ok", "kube_version": "1.29", "version": "ignored"},
            {"status": "idle", "version": "9.9"},
            {"platform": "Kubernetes"},
            "not-an-object"
        ]});
        let out = project("/v1/scan/platform", &value, &QueryParams::new().with("domain", "x")).unwrap();
        assert_eq!(
            out,
            json!([
                {"platform": "OpenShift", "status": "ok", "version": "4.12",
                 "high": 3, "medium": 5, "scanned_at": "2025-07-26T18:41:36Z"},
                {"platform": "Kubernetes", "status": "ok", "version": "1.29"},
                {"platform": null, "status": "idle", "version": "9.9"},
                {"platform": "Kubernetes", "status": null, "version": ""}
            ])
        );
    }

    #[test]
    fn platforms_string_field_is_an_error() {
        let err = project("/v1/scan/platform", &json!({"platforms": "x"}), &QueryParams::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to process platform data.");
    }

    #[test]
    fn domains_are_flattened_and_filtered() {
        let value = json!({"domains": [
            {"name": "kube-system", "workloads": 4, "running_workloads": 4, "running_pods": 6,
             "services": 2, "labels": {"a": "b"}},
            {"name": "_images", "workloads": 1},
            {"name": "Default", "workloads": 0}
        ]});
        let all = project("/v1/domain", &value, &QueryParams::new()).unwrap();
        assert_eq!(names(&all), vec!["kube-system", "Default"]);
        assert_eq!(
            all[0],
            json!({"name": "kube-system", "workloads": 4, "running_workloads": 4,
                   "running_pods": 6, "services": 2})
        );
        assert_eq!(
            all[1],
            json!({"name": "Default", "workloads": 0, "running_workloads": null,
                   "running_pods": null, "services": null})
        );

        let filtered = project("/v1/domain", &value, &QueryParams::new().with("domain", "KUBE")).unwrap();
        assert_eq!(names(&filtered), vec!["kube-system"]);
        let hidden = project("/v1/domain", &value, &QueryParams::new().with("domain", "images")).unwrap();
        assert_eq!(hidden, json!([]));
    }

    #[test]
    fn hosts_keep_underscore_names_and_lift_scan_summary() {
        let value = json!({"hosts": [
            {"name": "node-1", "state": "connected", "os": "Ubuntu", "platform": "Kubernetes",
             "containers": 12, "scan_summary": {"status": "finished", "high": 1, "medium": 2,
             "scanned_at": "2025-07-26"}},
            {"name": "_node-internal", "state": "connected", "os": "RHEL", "platform": "Kubernetes",
             "containers": 3}
        ]});
        let out = project("/v1/host", &value, &QueryParams::new()).unwrap();
        assert_eq!(
            out,
            json!([
                {"name": "node-1", "state": "connected", "os": "Ubuntu", "platform": "Kubernetes",
                 "containers": 12, "scan_status": "finished", "high": 1, "medium": 2,
                 "scanned_at": "2025-07-26"},
                {"name": "_node-internal", "state": "connected", "os": "RHEL",
                 "platform": "Kubernetes", "containers": 3}
            ])
        );

        let filtered = project("/v1/host", &value, &QueryParams::new().with("domain", "NODE-1")).unwrap();
        assert_eq!(names(&filtered), vec!["node-1"]);
    }

    #[test]
    fn every_recognized_shape_rejects_a_non_object() {
        for shape in Shape::ALL {
            let err = project(shape.key(), &json!("raw"), &QueryParams::new()).unwrap_err();
            assert_eq!(err.to_string(), format!("Failed to process {shape} data."));
        }
    }

    #[test]
    fn projection_leaves_source_untouched() {
        let value = groups();
        let before = value.clone();
        let _ = project("/v1/group", &value, &QueryParams::new().with("domain", "prod")).unwrap();
        assert_eq!(value, before);
    }
}
