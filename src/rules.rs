//! Rule tables: statement headings per template and the row rules that mark totals.
//!
//! Every predicate takes a key built by [`rule_key`](crate::utils::rule_key).

use crate::types::{ReportFormat, StatementKind};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Number of leading income rows searched for the revenue base.
pub const REVENUE_BASE_WINDOW: usize = 5;

/// Relative tolerance of the accounting equation check.
pub fn balance_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Heading of a statement in the given template, `None` when the template lacks it.
pub const fn statement_title(format: ReportFormat, kind: StatementKind) -> Option<&'static str> {
    match (format, kind) {
        (ReportFormat::Pre2010, StatementKind::Balance) => Some("BALANCE GENERAL"),
        (ReportFormat::Pre2010, StatementKind::Income) => Some("ESTADO DE GANANCIAS Y PERDIDAS"),
        (ReportFormat::Pre2010, StatementKind::ComprehensiveIncome) => None,
        (ReportFormat::Post2010, StatementKind::Balance) => Some("ESTADO DE SITUACION FINANCIERA"),
        (ReportFormat::Post2010, StatementKind::Income) => Some("ESTADO DE RESULTADOS"),
        (ReportFormat::Post2010, StatementKind::ComprehensiveIncome) => {
            Some("ESTADO DE RESULTADOS INTEGRALES")
        }
        (_, StatementKind::Equity) => Some("ESTADO DE CAMBIOS EN EL PATRIMONIO NETO"),
        (_, StatementKind::CashFlow) => Some("ESTADO DE FLUJO DE EFECTIVO"),
    }
}

macro_rules! rule {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect(concat!("valid rule ", stringify!($name))));
    };
}

rule!(TOTAL_ASSETS_POST, r"^(TOTAL (DE )?(LOS )?ACTIVOS|ACTIVOS TOTALES)$");
rule!(TOTAL_ASSETS_PRE, r"^TOTAL (DEL )?ACTIVO$");
rule!(TOTAL_LIABILITIES_POST, r"^(TOTAL (DE )?(LOS )?PASIVOS|PASIVOS TOTALES)$");
rule!(TOTAL_LIABILITIES_PRE, r"^TOTAL (DEL )?PASIVO$");
rule!(
    TOTAL_EQUITY,
    r"^(TOTAL (DEL )?PATRIMONIO( NETO)?|PATRIMONIO( NETO)? TOTAL)$"
);
rule!(
    TOTAL_CURRENT_ASSETS,
    r"^(TOTAL (DE )?(LOS )?ACTIVOS? CORRIENTES?|ACTIVOS? CORRIENTES? TOTALES?)$"
);
rule!(
    TOTAL_CURRENT_LIABILITIES,
    r"^(TOTAL (DE )?(LOS )?PASIVOS? CORRIENTES?|PASIVOS? CORRIENTES? TOTALES?)$"
);
rule!(INVENTORY, r"(INVENTARIOS?|EXISTENCIAS?)$");
rule!(TRADE_RECEIVABLE, r"CUENTAS POR COBRAR COMERCIALES");
rule!(
    NET_INCOME,
    r"(GANANCIA|PERDIDA|UTILIDAD) NETA DEL EJERCICIO|GANANCIA \(PERDIDA\)\s*NETA DEL EJERCICIO|RESULTADO DEL EJERCICIO|^GANANCIA \(PERDIDA\)\s*NETA|^(UTILIDAD|GANANCIA) NETA$"
);
rule!(
    ORDINARY_REVENUE,
    r"INGRESOS? DE ACTIVIDADES ORDINARIAS|INGRESOS? OPERACIONALES?|VENTAS NETAS?"
);
rule!(COST_OF_SALES, r"COSTOS? DE (LAS? )?VENTAS?");
rule!(REVENUE_BASE, r"\b(VENTAS|INGRESOS)\b");
rule!(
    CASH_FLOW_BASE_POST,
    r"FLUJOS? DE EFECTIVO.*(PROCEDENTES?|UTILIZAD[OA]S).*ACTIVIDADES DE (OPERACION|INVERSION|FINANCIACION|FINANCIAMIENTO)"
);
rule!(
    CASH_FLOW_BASE_PRE,
    r"(AUMENTO|DISMINUCION).*EFECTIVO.*PROVENIENTES? DE ACTIVIDADES DE (OPERACION|INVERSION|FINANCIACION|FINANCIAMIENTO)"
);

/// Row closing the assets section.
pub fn is_total_assets(format: ReportFormat, key: &str) -> bool {
    match format {
        ReportFormat::Pre2010 => TOTAL_ASSETS_PRE.is_match(key),
        ReportFormat::Post2010 => TOTAL_ASSETS_POST.is_match(key),
    }
}

/// Row closing the liabilities section (equity rows follow it).
pub fn is_total_liabilities(format: ReportFormat, key: &str) -> bool {
    match format {
        ReportFormat::Pre2010 => TOTAL_LIABILITIES_PRE.is_match(key),
        ReportFormat::Post2010 => TOTAL_LIABILITIES_POST.is_match(key),
    }
}

/// Total equity row.
pub fn is_total_equity(key: &str) -> bool {
    TOTAL_EQUITY.is_match(key)
}

/// Total current assets row.
pub fn is_total_current_assets(key: &str) -> bool {
    TOTAL_CURRENT_ASSETS.is_match(key)
}

/// Total current liabilities row.
pub fn is_total_current_liabilities(key: &str) -> bool {
    TOTAL_CURRENT_LIABILITIES.is_match(key)
}

/// Heading that opens the current assets block.
pub fn opens_current_assets(key: &str) -> bool {
    key.contains("ACTIVOS CORRIENTES") && !key.contains("TOTAL")
}

/// Row that closes the current assets block.
pub fn closes_current_assets(key: &str) -> bool {
    is_total_current_assets(key) || key.contains("ACTIVOS NO CORRIENTES")
}

/// Inventory row.
pub fn is_inventory(key: &str) -> bool {
    INVENTORY.is_match(key)
}

/// Trade receivables row (current or non-current part).
pub fn is_trade_receivable(key: &str) -> bool {
    TRADE_RECEIVABLE.is_match(key)
}

/// Trade receivables row that also includes other receivables.
pub fn is_full_trade_receivable(key: &str) -> bool {
    is_trade_receivable(key) && key.contains(" Y OTRAS")
}

/// Net income for the year.
pub fn is_net_income(key: &str) -> bool {
    NET_INCOME.is_match(key)
}

/// Net income row that covers the whole year rather than one group of operations.
pub fn is_net_income_for_year(key: &str) -> bool {
    is_net_income(key) && key.contains("DEL EJERCICIO")
}

/// Revenue from ordinary activities.
pub fn is_ordinary_revenue(key: &str) -> bool {
    ORDINARY_REVENUE.is_match(key)
}

/// Cost of sales.
pub fn is_cost_of_sales(key: &str) -> bool {
    COST_OF_SALES.is_match(key)
}

/// Candidate for the income statement base (sales or revenue).
pub fn is_revenue_base(key: &str) -> bool {
    REVENUE_BASE.is_match(key)
}

/// Net cash of an activity section, the base of that section in the cash flow.
pub fn is_cash_flow_base(key: &str) -> bool {
    CASH_FLOW_BASE_POST.is_match(key) || CASH_FLOW_BASE_PRE.is_match(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rule_key;

    #[test]
    fn totals_follow_the_template() {
        let post = ReportFormat::Post2010;
        let pre = ReportFormat::Pre2010;
        assert!(is_total_assets(post, &rule_key("TOTAL DE ACTIVOS")));
        assert!(is_total_assets(post, &rule_key("Activos Totales")));
        assert!(!is_total_assets(post, &rule_key("Total Activos Corrientes")));
        assert!(!is_total_assets(post, &rule_key("TOTAL ACTIVO")));
        assert!(is_total_assets(pre, &rule_key("TOTAL ACTIVO")));
        assert!(!is_total_assets(pre, &rule_key("TOTAL ACTIVO CORRIENTE")));
        assert!(is_total_liabilities(post, &rule_key("Total Pasivos")));
        assert!(!is_total_liabilities(post, &rule_key("TOTAL PASIVO Y PATRIMONIO")));
        assert!(is_total_liabilities(pre, &rule_key("TOTAL DEL PASIVO")));
        assert!(is_total_equity(&rule_key("Total Patrimonio Neto")));
    }

    #[test]
    fn cash_flow_bases_cover_both_templates() {
        assert!(is_cash_flow_base(&rule_key(
            "Flujos de Efectivo y Equivalente al Efectivo Procedente de (Utilizados en) Actividades de Operación"
        )));
        assert!(is_cash_flow_base(&rule_key(
            "AUMENTO (DISMINUCIÓN) DEL EFECTIVO PROVENIENTE DE ACTIVIDADES DE INVERSIÓN"
        )));
        assert!(!is_cash_flow_base(&rule_key("Aumento (Disminución) Neto de Efectivo")));
        assert!(!is_cash_flow_base(&rule_key("Actividades de Operación")));
    }

    #[test]
    fn income_rows_for_ratios() {
        assert!(is_net_income(&rule_key("Ganancia (Pérdida) Neta del Ejercicio")));
        assert!(!is_net_income(&rule_key("Ganancia (Pérdida) Bruta")));
        let continuing = rule_key("Ganancia (Pérdida) Neta de Operaciones Continuadas");
        assert!(is_net_income(&continuing));
        assert!(!is_net_income_for_year(&continuing));
        assert!(is_net_income_for_year(&rule_key("Utilidad Neta del Ejercicio")));
        assert!(is_ordinary_revenue(&rule_key("Ingresos de Actividades Ordinarias")));
        assert!(!is_ordinary_revenue(&rule_key("Otros Ingresos Operativos")));
        assert!(is_cost_of_sales(&rule_key("Costo de Ventas")));
        assert!(is_inventory(&rule_key("Inventarios")));
        assert!(is_full_trade_receivable(&rule_key(
            "Cuentas por Cobrar Comerciales y Otras Cuentas por Cobrar"
        )));
    }

    #[test]
    fn titles_depend_on_the_template() {
        assert_eq!(
            statement_title(ReportFormat::Pre2010, StatementKind::Balance),
            Some("BALANCE GENERAL")
        );
        assert_eq!(
            statement_title(ReportFormat::Pre2010, StatementKind::ComprehensiveIncome),
            None
        );
    }
}
