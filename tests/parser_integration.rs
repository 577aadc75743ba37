use rust_decimal::Decimal;
use smv_financial_report::{
    RawReport, Report, ReportBuilder, ReportError, ReportFormat, ReportSet, StatementKind,
};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Report {
    let file = std::fs::File::open(fixture_path(name)).expect("open fixture");
    let raw = RawReport::from_reader(file).expect("read fixture");
    ReportBuilder::new(&raw)
        .year_cutoff(2025)
        .parse()
        .expect("parse fixture")
}

#[test]
fn reads_post_2010_header() {
    let report = load_fixture("smv_2023.xls");
    assert_eq!(report.meta.company.as_deref(), Some("ALICORP S.A.A."));
    assert_eq!(report.meta.report_type.as_deref(), Some("Individual"));
    assert_eq!(report.meta.period.as_deref(), Some("Anual"));
    assert_eq!(report.meta.year, 2023);
    assert_eq!(report.meta.format, ReportFormat::Post2010);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn parses_post_2010_statements() {
    let report = load_fixture("smv_2023.xls");

    let balance = report.balance.as_ref().unwrap();
    assert_eq!(balance.title, "ESTADO DE SITUACION FINANCIERA");
    assert_eq!(balance.years, vec![2023, 2022]);
    assert_eq!(balance.accounts.len(), 25);
    let cash = &balance.accounts[2];
    assert_eq!(cash.name, "Efectivo y Equivalentes al Efectivo");
    assert_eq!(cash.note, "6");
    assert_eq!(cash.value(2023), d("100000"));
    assert_eq!(cash.value(2022), d("80000"));
    assert!(balance.accounts[5].is_total);
    assert!(!balance.accounts[4].is_total);
    assert_eq!(balance.accounts[0].value(2023), Decimal::ZERO);

    let income = report.income.as_ref().unwrap();
    assert_eq!(income.accounts.len(), 11);
    assert_eq!(income.accounts[1].value(2023), d("-480000"));
    let other = income
        .accounts
        .iter()
        .find(|a| a.name == "Otros Ingresos Operativos")
        .unwrap();
    assert_eq!(other.value(2022), Decimal::ZERO);

    let cash_flow = report.cash_flow.as_ref().unwrap();
    assert_eq!(cash_flow.accounts.len(), 12);
    assert_eq!(cash_flow.accounts[11].value(2023), d("20000"));

    let comprehensive = report.comprehensive_income.as_ref().unwrap();
    assert_eq!(comprehensive.title, "ESTADO DE RESULTADOS INTEGRALES");
    assert_eq!(comprehensive.accounts.len(), 3);
}

#[test]
fn equity_keeps_codes_and_total_column() {
    let report = load_fixture("smv_2023.xls");
    let equity = report.equity.as_ref().unwrap();
    assert_eq!(equity.years, vec![2023]);
    assert!(equity.has_codes());
    assert_eq!(equity.accounts.len(), 4);

    let opening = &equity.accounts[0];
    assert_eq!(opening.code.as_deref(), Some("3D0101"));
    assert_eq!(opening.value(2023), d("500000"));
    assert!(!opening.is_total);

    let closing = &equity.accounts[3];
    assert_eq!(closing.code.as_deref(), Some("3D9999"));
    assert_eq!(closing.value(2023), d("600000"));
    assert!(closing.is_total);
}

#[test]
fn balance_check_passes_for_consistent_totals() {
    let report = load_fixture("smv_2023.xls");
    let check = report.balance_check.as_ref().unwrap();
    assert_eq!(check.year, 2023);
    assert_eq!(check.total_assets, d("1000000"));
    assert_eq!(check.total_liabilities, d("400000"));
    assert_eq!(check.total_equity, d("600000"));
    assert_eq!(check.difference, Decimal::ZERO);
    assert!(check.is_balanced);
}

#[test]
fn missing_statement_becomes_a_warning() {
    let report = load_fixture("smv_2022.xls");
    assert!(report.equity.is_none());
    assert!(report.balance.is_some());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("ESTADO DE CAMBIOS EN EL PATRIMONIO NETO"));
}

#[test]
fn latin1_pre_2010_report() {
    let report = load_fixture("smv_2008.xls");
    assert_eq!(report.meta.year, 2008);
    assert_eq!(report.meta.format, ReportFormat::Pre2010);
    assert!(report.meta.company_or_default().contains("COMPAÑIA"));

    let balance = report.balance.as_ref().unwrap();
    assert_eq!(balance.title, "BALANCE GENERAL");
    assert_eq!(balance.years, vec![2008, 2007]);
    let income = report.income.as_ref().unwrap();
    assert_eq!(income.accounts[3].name, "Gastos de Administración");

    assert!(report.comprehensive_income.is_none());
    assert!(report.cash_flow.is_none());
    assert_eq!(report.warnings.len(), 2);
    assert!(report.balance_check.as_ref().unwrap().is_balanced);
}

#[test]
fn statements_can_be_skipped() {
    let file = std::fs::File::open(fixture_path("smv_2022.xls")).unwrap();
    let raw = RawReport::from_reader(file).unwrap();
    let report = ReportBuilder::new(&raw)
        .year_cutoff(2025)
        .equity(false)
        .cash_flow(false)
        .parse()
        .unwrap();
    assert!(report.warnings.is_empty());
    assert!(report.cash_flow.is_none());
    assert!(report.statement(StatementKind::Income).is_some());
}

#[test]
fn document_year_override_changes_template() {
    let file = std::fs::File::open(fixture_path("smv_2008.xls")).unwrap();
    let raw = RawReport::from_reader(file).unwrap();
    let report = ReportBuilder::new(&raw)
        .document_year(2011)
        .parse()
        .unwrap();
    assert_eq!(report.meta.format, ReportFormat::Post2010);
    assert!(report.balance.is_none());
    assert!(report.balance_check.is_none());
}

#[test]
fn report_without_year_is_rejected() {
    let raw = RawReport::from_str("<html><body><div>Empresa: SIN FECHA S.A.</div></body></html>");
    let err = Report::parse(&raw).unwrap_err();
    assert!(matches!(err, ReportError::MissingField { field: "year" }));
}

#[test]
fn loads_fixture_directory() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");
    let set = ReportSet::from_dir_with(dir, |builder| builder.year_cutoff(2025).parse()).unwrap();
    let years: Vec<i32> = set.reports.iter().map(|r| r.meta.year).collect();
    assert_eq!(years, vec![2008, 2022, 2023]);

    let post: Vec<i32> = set.post_2010().iter().map(|r| r.meta.year).collect();
    assert_eq!(post, vec![2023, 2022]);
}

#[test]
fn bad_file_is_skipped_not_fatal() {
    let dir = std::env::temp_dir().join(format!("smv-report-skip-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::copy(fixture_path("smv_2023.xls"), dir.join("a.xls")).unwrap();
    std::fs::write(
        dir.join("b.xls"),
        "<html><body><div>Empresa: SIN FECHA S.A.</div></body></html>",
    )
    .unwrap();

    let set = ReportSet::from_dir_with(&dir, |builder| builder.year_cutoff(2025).parse()).unwrap();
    assert_eq!(set.reports.len(), 1);
    assert_eq!(set.reports[0].meta.year, 2023);
    assert_eq!(set.skipped.len(), 1);
    assert_eq!(set.skipped[0].path, dir.join("b.xls"));
    assert!(set.skipped[0].reason.contains("year"), "{}", set.skipped[0].reason);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn malformed_cell_is_a_report_warning() {
    let raw = RawReport::from_str(
        r#"<html><body><div>Empresa: PRUEBA S.A.</div><div>Año: 2023</div>
        <span style="font-weight:bold">ESTADO DE RESULTADOS</span>
        <table>
          <tr><td>Cuenta</td><td>Nota</td><td>2023</td><td>2022</td></tr>
          <tr><td>Cuenta</td><td>Nota</td><td>2023</td><td>2022</td></tr>
          <tr><td>Ingresos de Actividades Ordinarias</td><td></td><td>1,000</td><td>900</td></tr>
          <tr><td>Ganancia (Pérdida) Neta del Ejercicio</td><td></td><td>1.2.3</td><td>90</td></tr>
        </table></body></html>"#,
    );
    let report = ReportBuilder::new(&raw)
        .balance(false)
        .equity(false)
        .cash_flow(false)
        .comprehensive_income(false)
        .year_cutoff(2025)
        .parse()
        .unwrap();
    let income = report.income.as_ref().unwrap();
    assert_eq!(income.accounts.len(), 2);
    assert_eq!(income.accounts[0].value(2023), d("1000"));
    assert_eq!(income.accounts[1].value(2023), Decimal::ZERO);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("1.2.3"), "{:?}", report.warnings);
}
