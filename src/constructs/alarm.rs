// Copyright (c) 2025 - Cowboy AI, Inc.
//! Monitoring Constructor
//!
//! Notification topic, alarms over the functions, table, API and container
//! service, log-derived error metrics, and one dashboard showing all of it.
//! Every alarm treats missing data as non-breaching.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{logical, names, Construction, Constructor, Stage, Upstream};
use crate::assembler::GraphError;
use crate::config::AppConfig;
use crate::domain::{LogicalName, ResourceKind};
use crate::goals::GoalOperation;
use crate::resource::ResourceHandle;

/// Missing-data policy of every alarm
pub const MISSING_DATA_POLICY: &str = "notBreaching";

/// Log lines a handler function counts as errors
pub const FUNCTION_ERROR_PATTERN: &str = "\"error\"";

/// Namespace of the metrics derived from log lines, one per environment
pub fn log_metric_namespace(config: &AppConfig) -> String {
    format!("GoalsApp-{}", config.environment)
}

/// Aggregation applied over one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Statistic {
    Average,
    Sum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
}

/// One metric series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metric {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub statistic: Statistic,
    pub period_seconds: u32,
}

impl Metric {
    fn new(namespace: &str, metric_name: &str, statistic: Statistic, period_seconds: u32) -> Self {
        Self {
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            dimensions: BTreeMap::new(),
            statistic,
            period_seconds,
        }
    }

    fn dimension(mut self, key: &str, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.to_string(), value.into());
        self
    }
}

/// Threshold condition over a metric
#[derive(Debug, Clone, PartialEq)]
struct Rule {
    metric: Metric,
    comparison: Comparison,
    threshold: f64,
    evaluation_periods: u32,
}

impl Rule {
    fn at_least(metric: Metric, threshold: f64, evaluation_periods: u32) -> Self {
        Self {
            metric,
            comparison: Comparison::GreaterThanOrEqualToThreshold,
            threshold,
            evaluation_periods,
        }
    }

    fn above(metric: Metric, threshold: f64, evaluation_periods: u32) -> Self {
        Self {
            metric,
            comparison: Comparison::GreaterThanThreshold,
            threshold,
            evaluation_periods,
        }
    }
}

/// `alarm-<suffix>`, normalised into a valid logical name
fn alarm_name(suffix: &str) -> Result<LogicalName, GraphError> {
    Ok(logical("alarm")?.child(suffix)?)
}

/// Collects the handles of one monitoring construction
struct Monitoring<'c> {
    config: &'c AppConfig,
    handles: Vec<ResourceHandle>,
    widgets: Vec<Value>,
}

impl<'c> Monitoring<'c> {
    fn alarm(
        &mut self,
        suffix: &str,
        description: &str,
        rule: Rule,
        watched: &[&ResourceHandle],
        actions: &[String],
    ) -> Result<(), GraphError> {
        let mut builder = ResourceHandle::builder(alarm_name(suffix)?, ResourceKind::Alarm)
            .properties(json!({
                "AlarmName": format!("{}-{}", self.config.resource_prefix(), suffix),
                "AlarmDescription": description,
                "Metric": rule.metric,
                "ComparisonOperator": rule.comparison,
                "Threshold": rule.threshold,
                "EvaluationPeriods": rule.evaluation_periods,
                "TreatMissingData": MISSING_DATA_POLICY,
                "AlarmActions": actions,
            }))
            .deferred("arn");
        for handle in watched {
            builder = builder.depends_on(handle);
        }
        self.widgets.push(json!({ "Title": description, "Metrics": [rule.metric] }));
        self.handles.push(builder.build()?);
        Ok(())
    }

    /// Metric filter counting matching lines of `logs`
    fn metric_filter(
        &mut self,
        suffix: &str,
        logs: &ResourceHandle,
        pattern: &str,
        metric_name: &str,
    ) -> Result<ResourceHandle, GraphError> {
        let filter = ResourceHandle::builder(alarm_name(suffix)?, ResourceKind::MetricFilter)
            .depends_on(logs)
            .properties(json!({
                "LogGroupName": logs.output("name")?,
                "FilterPattern": pattern,
                "MetricNamespace": log_metric_namespace(self.config),
                "MetricName": metric_name,
                "MetricValue": "1",
            }))
            .build()?;
        self.handles.push(filter.clone());
        Ok(filter)
    }

    fn function_alarms(&mut self, operation: GoalOperation, upstream: &Upstream<'_>) -> Result<(), GraphError> {
        let function = upstream.get(&names::function(operation))?;
        let logs = upstream.get(&names::function_logs(operation))?;
        let slug = operation.as_str().to_ascii_lowercase();
        let function_name = function.output("name")?;

        let duration = Metric::new("AWS/Lambda", "Duration", Statistic::Average, 120)
            .dimension("FunctionName", function_name);
        self.alarm(
            &format!("{}-duration", slug),
            &format!("{} duration", operation),
            Rule::at_least(duration, 2000.0, 1),
            &[function],
            &[],
        )?;

        let metric_name = format!("{}-Errors-{}", operation, self.config.environment);
        let filter = self.metric_filter(
            &format!("{}-errors-filter", slug),
            logs,
            FUNCTION_ERROR_PATTERN,
            &metric_name,
        )?;
        let namespace = log_metric_namespace(self.config);
        let errors = Metric::new(&namespace, &metric_name, Statistic::Sum, 60);
        self.alarm(
            &format!("{}-errors", slug),
            &format!("{} errors", operation),
            Rule::at_least(errors, 1.0, 1),
            &[function, &filter],
            &[],
        )
    }

    fn table_alarms(&mut self, table: &ResourceHandle) -> Result<(), GraphError> {
        let table_name = table.output("name")?;
        let metric = |name: &str| {
            Metric::new("AWS/DynamoDB", name, Statistic::Sum, 300).dimension("TableName", table_name)
        };

        self.alarm(
            "table-read",
            "Table consumed read capacity",
            Rule::above(metric("ConsumedReadCapacityUnits"), 100.0, 1),
            &[table],
            &[],
        )?;
        self.alarm(
            "table-write",
            "Table consumed write capacity",
            Rule::above(metric("ConsumedWriteCapacityUnits"), 100.0, 1),
            &[table],
            &[],
        )?;
        self.alarm(
            "table-throttled",
            "Table throttled requests",
            Rule::at_least(metric("ThrottledRequests"), 1.0, 1),
            &[table],
            &[],
        )
    }

    fn api_alarms(
        &mut self,
        api: &ResourceHandle,
        logs: &ResourceHandle,
        topic: &ResourceHandle,
    ) -> Result<(), GraphError> {
        let metric_name = format!("Api-500-Errors-{}", self.config.environment);
        let filter = self.metric_filter("api-errors-filter", logs, "{ $.status = 500 }", &metric_name)?;
        let namespace = log_metric_namespace(self.config);
        let errors = Metric::new(&namespace, &metric_name, Statistic::Sum, 60);
        self.alarm(
            "api-errors",
            "API server errors",
            Rule::at_least(errors, 1.0, 1),
            &[api, &filter, topic],
            &[topic.reference("arn")?],
        )?;

        let latency = Metric::new("AWS/ApiGateway", "Latency", Statistic::Average, 60)
            .dimension("ApiName", api.output("name")?);
        self.alarm(
            "api-latency",
            "API latency",
            Rule::at_least(latency, 2000.0, 1),
            &[api],
            &[],
        )
    }

    fn service_alarms(&mut self, service: &ResourceHandle) -> Result<(), GraphError> {
        let cluster_name = service.output("cluster_name")?;
        let service_name = service.output("name")?;
        let metric = |name: &str| {
            Metric::new("AWS/ECS", name, Statistic::Average, 300)
                .dimension("ClusterName", cluster_name)
                .dimension("ServiceName", service_name)
        };

        self.alarm(
            "service-cpu",
            "Service CPU utilisation",
            Rule::above(metric("CPUUtilization"), 80.0, 2),
            &[service],
            &[],
        )?;
        self.alarm(
            "service-memory",
            "Service memory utilisation",
            Rule::above(metric("MemoryUtilization"), 80.0, 2),
            &[service],
            &[],
        )
    }
}

/// Alarms, topic and dashboard over every monitored resource
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitoringConstructor;

impl Constructor for MonitoringConstructor {
    fn name(&self) -> &str {
        names::DASHBOARD
    }

    fn stage(&self) -> Stage {
        Stage::Alarm
    }

    fn dependencies(&self) -> Vec<String> {
        let mut deps: Vec<String> = GoalOperation::ALL
            .into_iter()
            .flat_map(|op| [names::function(op), names::function_logs(op)])
            .collect();
        deps.extend(
            [
                names::TABLE,
                names::API,
                names::API_LOGS,
                names::SERVICE,
                names::LOAD_BALANCER,
            ]
            .map(String::from),
        );
        deps
    }

    fn construct(&self, config: &AppConfig, upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let subscriptions: Vec<Value> = config
            .alarm_email
            .iter()
            .map(|email| json!({ "Protocol": "email", "Endpoint": email }))
            .collect();
        let topic = ResourceHandle::builder(logical(names::ALARM_TOPIC)?, ResourceKind::Topic)
            .properties(json!({
                "TopicName": format!("{}-alarms", config.resource_prefix()),
                "Subscriptions": subscriptions,
            }))
            .deferred("arn")
            .build()?;

        let mut monitoring = Monitoring {
            config,
            handles: Vec::new(),
            widgets: Vec::new(),
        };
        for operation in GoalOperation::ALL {
            monitoring.function_alarms(operation, upstream)?;
        }
        monitoring.table_alarms(upstream.get(names::TABLE)?)?;
        monitoring.api_alarms(upstream.get(names::API)?, upstream.get(names::API_LOGS)?, &topic)?;
        monitoring.service_alarms(upstream.get(names::SERVICE)?)?;

        let lb = upstream.get(names::LOAD_BALANCER)?;
        let requests = Metric::new("AWS/ApplicationELB", "RequestCount", Statistic::Sum, 60)
            .dimension("LoadBalancer", lb.reference("full_name")?);
        monitoring
            .widgets
            .push(json!({ "Title": "Load balancer requests", "Metrics": [requests] }));

        let Monitoring { handles, widgets, .. } = monitoring;
        let mut dashboard = ResourceHandle::builder(logical(names::DASHBOARD)?, ResourceKind::Dashboard)
            .depends_on(lb)
            .properties(json!({
                "DashboardName": format!("{}-dashboard", config.resource_prefix()),
                "Widgets": widgets,
            }))
            .output("name", format!("{}-dashboard", config.resource_prefix()));
        for alarm in handles.iter().filter(|h| h.kind() == ResourceKind::Alarm) {
            dashboard = dashboard.depends_on(alarm);
        }
        let dashboard = dashboard.build()?;

        let mut out = Construction::builder(self.name());
        out.add(topic);
        handles.into_iter().for_each(|h| out.add(h));
        out.add_primary(dashboard);
        out.build()
    }
}
