// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The versioned catalog of metrics and dimensions the warehouse knows.
//!
//! Every structured query references this catalog and nothing else; the
//! planner rejects utterances whose data vocabulary matches no entry. The
//! compiled-in catalog mirrors the warehouse's star schema (one reseller
//! sales fact table, dimension tables for employee/product/territory), with
//! aliases in English and Arabic. Deployments can replace it wholesale from
//! configuration.

use bayan_config::model::CatalogConfig;
use bayan_core::BayanError;

/// Aggregate applied over a metric's measure column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Avg,
    Count,
}

impl Aggregate {
    fn parse(s: &str) -> Result<Self, BayanError> {
        match s {
            "sum" => Ok(Aggregate::Sum),
            "avg" => Ok(Aggregate::Avg),
            "count" => Ok(Aggregate::Count),
            other => Err(BayanError::Config(format!(
                "unknown aggregate `{other}` in catalog"
            ))),
        }
    }
}

/// A queryable measure.
#[derive(Debug, Clone)]
pub struct CatalogMetric {
    pub id: String,
    pub aliases: Vec<String>,
    pub fact_table: String,
    pub value_column: String,
    pub aggregate: Aggregate,
    pub date_column: String,
}

/// A groupable dimension.
#[derive(Debug, Clone)]
pub struct CatalogDimension {
    pub id: String,
    pub aliases: Vec<String>,
    pub table: String,
    pub fact_key_column: String,
    pub label_column: String,
}

/// Fixed, versioned catalog of known metrics and dimensions.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub version: String,
    metrics: Vec<CatalogMetric>,
    dimensions: Vec<CatalogDimension>,
}

impl Catalog {
    /// Build from configuration, falling back to the compiled-in entries for
    /// whichever of metrics/dimensions the config leaves empty.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, BayanError> {
        let builtin = Self::builtin(config.version.clone());

        let metrics = if config.metrics.is_empty() {
            builtin.metrics
        } else {
            config
                .metrics
                .iter()
                .map(|m| {
                    Ok(CatalogMetric {
                        id: m.id.clone(),
                        aliases: m.aliases.clone(),
                        fact_table: m.fact_table.clone(),
                        value_column: m.value_column.clone(),
                        aggregate: Aggregate::parse(&m.aggregate)?,
                        date_column: m.date_column.clone(),
                    })
                })
                .collect::<Result<Vec<_>, BayanError>>()?
        };

        let dimensions = if config.dimensions.is_empty() {
            builtin.dimensions
        } else {
            config
                .dimensions
                .iter()
                .map(|d| CatalogDimension {
                    id: d.id.clone(),
                    aliases: d.aliases.clone(),
                    table: d.table.clone(),
                    fact_key_column: d.fact_key_column.clone(),
                    label_column: d.label_column.clone(),
                })
                .collect()
        };

        Ok(Self {
            version: config.version.clone(),
            metrics,
            dimensions,
        })
    }

    /// The compiled-in catalog over the reseller sales star schema.
    pub fn builtin(version: String) -> Self {
        let metrics = vec![
            CatalogMetric {
                id: "revenue".into(),
                aliases: [
                    "revenue", "sales amount", "sales", "income", "turnover",
                    "الإيرادات", "إيرادات", "المبيعات", "مبيعات", "الدخل",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                fact_table: "factResellerSales".into(),
                value_column: "SalesAmount".into(),
                aggregate: Aggregate::Sum,
                date_column: "OrderDate".into(),
            },
            CatalogMetric {
                id: "orders".into(),
                aliases: [
                    "orders", "order count", "number of orders",
                    "الطلبات", "عدد الطلبات",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                fact_table: "factResellerSales".into(),
                value_column: "SalesOrderNumber".into(),
                aggregate: Aggregate::Count,
                date_column: "OrderDate".into(),
            },
            CatalogMetric {
                id: "quantity".into(),
                aliases: [
                    "quantity", "units sold", "units", "volume",
                    "الكمية", "الوحدات المباعة",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                fact_table: "factResellerSales".into(),
                value_column: "OrderQuantity".into(),
                aggregate: Aggregate::Sum,
                date_column: "OrderDate".into(),
            },
        ];

        let dimensions = vec![
            CatalogDimension {
                id: "employee".into(),
                aliases: [
                    "employee", "employees", "salesperson", "staff",
                    "الموظف", "الموظفين", "موظف",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                table: "dimEmployee".into(),
                fact_key_column: "EmployeeKey".into(),
                label_column: "EmployeeName".into(),
            },
            CatalogDimension {
                id: "product".into(),
                aliases: [
                    "product", "products", "المنتج", "المنتجات", "منتج",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                table: "dimProduct".into(),
                fact_key_column: "ProductKey".into(),
                label_column: "ProductName".into(),
            },
            CatalogDimension {
                id: "region".into(),
                aliases: [
                    "region", "territory", "المنطقة", "الإقليم", "منطقة",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                table: "dimSalesTerritory".into(),
                fact_key_column: "SalesTerritoryKey".into(),
                label_column: "SalesTerritoryRegion".into(),
            },
        ];

        Self {
            version,
            metrics,
            dimensions,
        }
    }

    pub fn metric(&self, id: &str) -> Option<&CatalogMetric> {
        self.metrics.iter().find(|m| m.id == id)
    }

    pub fn dimension(&self, id: &str) -> Option<&CatalogDimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }

    pub fn metrics(&self) -> &[CatalogMetric] {
        &self.metrics
    }

    pub fn dimensions(&self) -> &[CatalogDimension] {
        &self.dimensions
    }

    /// Every alias in the catalog, for the classifier's vocabulary signal.
    pub fn vocabulary(&self) -> Vec<String> {
        self.metrics
            .iter()
            .flat_map(|m| m.aliases.iter().cloned())
            .chain(self.dimensions.iter().flat_map(|d| d.aliases.iter().cloned()))
            .collect()
    }
}
