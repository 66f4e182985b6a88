//! Aggregate report tables built from the cleaned sales tables
//!
//! Every report is a `CREATE TABLE <name> AS SELECT ...` over the `_clean`
//! tables produced by a pipeline run. Reports run in list order because the
//! later ones read from earlier ones (`ventas_diarias_acumuladas` reads
//! `ventas_diarias`, `variacion_ventas` reads `comparacion_periodos`).

use crate::store::quote_ident;
use eyre::Result;
use owo_colors::OwoColorize;
use std::collections::BTreeSet;
use std::future::Future;

/// Something that can run SQL statements atomically
pub trait SqlExecutor: Send + Sync {
    /// Run `statements` in order inside one transaction
    ///
    /// # Errors
    /// Returns the first failing statement's error; nothing is committed
    fn execute_in_transaction(
        &self,
        statements: &[String],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// One report table definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub name: &'static str,
    pub description: &'static str,
    query: &'static str,
}

impl Report {
    /// Drop-and-create statements for this report
    pub fn statements(&self) -> Vec<String> {
        vec![
            format!("DROP TABLE IF EXISTS {}", quote_ident(self.name)),
            format!("CREATE TABLE {} AS {}", quote_ident(self.name), self.query),
        ]
    }
}

/// All reports, in build order
pub static REPORTS: &[Report] = &[
    Report {
        name: "ventas_diarias",
        description: "Daily sales",
        query: concat!(
            r#"SELECT date_trunc('day', "PAGADO_EN") AS fecha, SUM("TOTAL") AS ventas_totales "#,
            r#"FROM ventatickets_clean WHERE "ESTA_ABIERTO" = 'f' AND "ESTA_CANCELADO" = 'f' "#,
            "GROUP BY fecha ORDER BY fecha"
        ),
    },
    Report {
        name: "ventas_semanales",
        description: "Weekly sales",
        query: concat!(
            r#"SELECT date_trunc('week', "PAGADO_EN") AS semana, SUM("TOTAL") AS ventas_totales "#,
            r#"FROM ventatickets_clean WHERE "ESTA_ABIERTO" = 'f' AND "ESTA_CANCELADO" = 'f' "#,
            "GROUP BY semana ORDER BY semana"
        ),
    },
    Report {
        name: "ventas_mensuales",
        description: "Monthly sales",
        query: concat!(
            r#"SELECT date_trunc('month', "PAGADO_EN") AS mes, SUM("TOTAL") AS ventas_totales "#,
            r#"FROM ventatickets_clean WHERE "ESTA_ABIERTO" = 'f' AND "ESTA_CANCELADO" = 'f' "#,
            "GROUP BY mes ORDER BY mes"
        ),
    },
    Report {
        name: "ventas_anuales",
        description: "Yearly sales",
        query: concat!(
            r#"SELECT date_trunc('year', "PAGADO_EN") AS anio, SUM("TOTAL") AS ventas_totales "#,
            r#"FROM ventatickets_clean WHERE "ESTA_ABIERTO" = 'f' AND "ESTA_CANCELADO" = 'f' "#,
            "GROUP BY anio ORDER BY anio"
        ),
    },
    Report {
        name: "productos_mas_vendidos",
        description: "Best-selling products per month",
        query: concat!(
            r#"SELECT date_trunc('month', "PAGADO_EN") AS mes, "PRODUCTO_NOMBRE", "#,
            r#"SUM("CANTIDAD") AS total_ventas "#,
            r#"FROM ventatickets_articulos_clean WHERE "FUE_DEVUELTO" = 'f' "#,
            r#"GROUP BY mes, "PRODUCTO_NOMBRE" ORDER BY mes, total_ventas DESC"#
        ),
    },
    Report {
        name: "ventas_por_departamento",
        description: "Sales per department",
        query: concat!(
            r#"SELECT d."NOMBRE" AS nombre, "#,
            r#"SUM(vta."CANTIDAD" * vta."PRECIO_USADO") AS ventas_totales "#,
            "FROM ventatickets_articulos_clean vta ",
            r#"JOIN departamentos_clean d ON vta."DEPARTAMENTO_ID" = d."ID" "#,
            r#"WHERE vta."FUE_DEVUELTO" = 'f' "#,
            r#"GROUP BY d."NOMBRE" ORDER BY ventas_totales DESC"#
        ),
    },
    Report {
        name: "ventas_por_hora",
        description: "Sales count per hour of day",
        query: concat!(
            r#"SELECT EXTRACT(hour FROM "PAGADO_EN") AS hora, COUNT(*) AS cantidad_ventas "#,
            r#"FROM ventatickets_clean WHERE "ESTA_ABIERTO" = 'f' AND "ESTA_CANCELADO" = 'f' "#,
            "GROUP BY hora ORDER BY hora"
        ),
    },
    Report {
        name: "ventas_por_dia_semana",
        description: "Sales count per weekday",
        query: concat!(
            r#"SELECT EXTRACT(dow FROM "PAGADO_EN") AS dia_semana, COUNT(*) AS cantidad_ventas "#,
            r#"FROM ventatickets_clean WHERE "ESTA_ABIERTO" = 'f' AND "ESTA_CANCELADO" = 'f' "#,
            "GROUP BY dia_semana ORDER BY dia_semana"
        ),
    },
    Report {
        name: "ventas_diarias_acumuladas",
        description: "Cumulative daily sales",
        query: concat!(
            "SELECT fecha, ventas_totales, ",
            "SUM(ventas_totales) OVER (ORDER BY fecha) AS ventas_acumuladas ",
            "FROM ventas_diarias"
        ),
    },
    Report {
        name: "comparacion_periodos",
        description: "Monthly sales by year, for period comparison",
        query: concat!(
            r#"SELECT date_trunc('month', "PAGADO_EN") AS mes, "#,
            r#"EXTRACT(year FROM "PAGADO_EN") AS anio, SUM("TOTAL") AS ventas "#,
            r#"FROM ventatickets_clean WHERE "ESTA_ABIERTO" = 'f' AND "ESTA_CANCELADO" = 'f' "#,
            "GROUP BY mes, anio ORDER BY mes, anio"
        ),
    },
    Report {
        name: "variacion_ventas",
        description: "Month-over-month sales variation (%)",
        query: concat!(
            "SELECT mes, anio, ventas, ",
            "LAG(ventas) OVER w AS ventas_periodo_anterior, ",
            "CASE WHEN LAG(ventas) OVER w > 0 ",
            "THEN ((ventas - LAG(ventas) OVER w) / LAG(ventas) OVER w) * 100 ",
            "ELSE NULL END AS variacion_pct ",
            "FROM comparacion_periodos ",
            "WINDOW w AS (PARTITION BY anio ORDER BY mes)"
        ),
    },
];

/// Pick reports by name, keeping build order
///
/// An empty `only` selects every report.
///
/// # Errors
/// Returns an error naming any requested report that does not exist
pub fn select(only: &[String]) -> Result<Vec<&'static Report>> {
    if only.is_empty() {
        return Ok(REPORTS.iter().collect());
    }

    let wanted: BTreeSet<String> = only.iter().map(|n| n.trim().to_lowercase()).collect();
    let unknown: Vec<&str> = wanted
        .iter()
        .filter(|name| !REPORTS.iter().any(|r| r.name == name.as_str()))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        eyre::bail!("Unknown report(s): {}", unknown.join(", "));
    }

    Ok(REPORTS
        .iter()
        .filter(|r| wanted.contains(r.name))
        .collect())
}

/// Result of building one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub name: &'static str,
    /// `None` on success, the error chain otherwise
    pub error: Option<String>,
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Build each report in its own transaction
///
/// A failing report is recorded and the remaining reports still run.
pub async fn build<E: SqlExecutor>(executor: &E, reports: &[&Report]) -> Vec<ReportOutcome> {
    let mut outcomes = Vec::with_capacity(reports.len());

    for report in reports {
        log::info!("Building report {}", report.name.cyan());
        let error = match executor.execute_in_transaction(&report.statements()).await {
            Ok(()) => {
                log::info!("{} {}", "✓".green(), report.name);
                None
            }
            Err(e) => {
                log::error!("{} {}: {:#}", "✗".red(), report.name, e);
                Some(format!("{e:#}"))
            }
        };
        outcomes.push(ReportOutcome {
            name: report.name,
            error,
        });
    }

    outcomes
}
