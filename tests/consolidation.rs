use calamine::{Data, Reader, open_workbook_auto};
use rust_decimal::Decimal;
use smv_financial_report::{
    RawReport, Report, ReportBuilder, ReportSet, StatementKind, export_set, render_table,
    round_dp, write_ratios_csv, write_table_csv, write_workbook,
};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn load_fixture(name: &str) -> Report {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let raw = RawReport::from_reader(std::fs::File::open(path).unwrap()).unwrap();
    ReportBuilder::new(&raw).year_cutoff(2025).parse().unwrap()
}

fn fixture_set() -> ReportSet {
    ReportSet::from(vec![
        load_fixture("smv_2022.xls"),
        load_fixture("smv_2008.xls"),
        load_fixture("smv_2023.xls"),
    ])
}

fn rounded(cells: &[Option<Decimal>]) -> Vec<Option<Decimal>> {
    cells.iter().map(|c| c.map(|v| round_dp(v, 2))).collect()
}

#[test]
fn consolidated_values_prefer_newest_report() {
    let set = fixture_set();
    let balance = set.consolidate_values(StatementKind::Balance).unwrap();
    assert_eq!(balance.columns, vec!["2023", "2022", "2021"]);
    assert_eq!(balance.rows.len(), 25);

    let cash = balance.row("Efectivo y Equivalentes al Efectivo").unwrap();
    assert_eq!(
        cash.cells,
        vec![Some(d("100000")), Some(d("80000")), Some(d("70000"))]
    );

    let receivables: Vec<_> = balance
        .rows_named("Cuentas por Cobrar Comerciales y Otras Cuentas por Cobrar")
        .collect();
    assert_eq!(receivables.len(), 2);
    assert_eq!(receivables[1].cells[2], Some(d("20000")));
}

#[test]
fn consolidated_values_leave_gaps_empty() {
    let set = fixture_set();
    let income = set.consolidate_values(StatementKind::Income).unwrap();
    let other = income.row("otros ingresos operativos").unwrap();
    assert_eq!(other.cells, vec![Some(d("5000")), Some(Decimal::ZERO), None]);

    let equity = set.consolidate_values(StatementKind::Equity).unwrap();
    assert_eq!(equity.columns, vec!["2023"]);
    assert_eq!(equity.rows[0].code.as_deref(), Some("3D0101"));

    let rendered = render_table(&income, None);
    assert!(rendered.starts_with("Income statement\n"));
}

#[test]
fn consolidated_vertical_one_column_per_year() {
    let set = fixture_set();
    let vertical = set.consolidate_vertical();
    let assets = vertical.assets.as_ref().unwrap();
    assert_eq!(assets.title, "Vertical analysis: assets");
    assert_eq!(assets.columns, vec!["2023", "2022"]);
    let cash = assets.row("Efectivo y Equivalentes al Efectivo").unwrap();
    assert_eq!(rounded(&cash.cells), vec![Some(d("10")), Some(d("9.39"))]);

    assert!(vertical.liabilities.is_some());
    assert!(vertical.income.is_some());
    assert!(vertical.cash_flow.is_some());
}

#[test]
fn consolidated_horizontal_and_top_rows() {
    let set = fixture_set();
    let horizontal = set.consolidate_horizontal();
    let balance = horizontal.balance.as_ref().unwrap();
    assert_eq!(balance.title, "Horizontal analysis: balance sheet");
    assert_eq!(balance.columns, vec!["2023 vs 2022", "2022 vs 2021"]);

    let cash = balance.row("Efectivo y Equivalentes al Efectivo").unwrap();
    assert_eq!(rounded(&cash.cells), vec![Some(d("25")), Some(d("21.43"))]);

    let top = balance.top_by_mean_abs(1);
    assert_eq!(top.len(), 1);
    assert_eq!(
        top[0].account,
        "Cuentas por Cobrar Comerciales y Otras Cuentas por Cobrar"
    );
    assert_eq!(round_dp(top[0].cells[0].unwrap(), 2), d("66.67"));

    let income = horizontal.income.as_ref().unwrap();
    let other = income.row("Otros Ingresos Operativos").unwrap();
    assert_eq!(other.cells, vec![None, None]);
}

#[test]
fn table_and_ratio_csv() {
    let set = fixture_set();
    let equity = set.consolidate_values(StatementKind::Equity).unwrap();
    let bytes = write_table_csv(Vec::new(), &equity).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Code,Account,2023"));
    assert_eq!(
        lines.next(),
        Some("3D0101,Saldo Inicial al 1 de Enero de 2023,\"500,000\"")
    );

    let bytes = write_ratios_csv(Vec::new(), &set.ratios().unwrap()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Ratio,Category,2022,2023,Min,Max,Mean");
    assert_eq!(lines[1], "Current ratio,Liquidity,1.58,1.80,1.58,1.80,1.69");
    assert_eq!(lines[3], "Debt ratio,Leverage,44.20%,40.00%,40.00%,44.20%,42.10%");
}

#[test]
fn export_writes_every_view() {
    let set = fixture_set();
    let dir = std::env::temp_dir().join(format!("smv-report-export-{}", std::process::id()));
    let written = export_set(&set, &dir).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    for expected in [
        "report_01_2022.json",
        "report_02_2008.json",
        "report_03_2023.json",
        "values_balance.csv",
        "values_equity.csv",
        "ratios.csv",
        "consolidated.xlsx",
    ] {
        assert!(names.iter().any(|n| n == expected), "{expected} in {names:?}");
    }
    assert!(names.iter().any(|n| n.starts_with("vertical_")));
    assert!(names.iter().any(|n| n.starts_with("horizontal_")));
    assert!(written.iter().all(|p| p.exists()));

    let json = std::fs::read_to_string(dir.join("report_03_2023.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["meta"]["company"], "ALICORP S.A.A.");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn workbook_has_one_sheet_per_table() {
    let set = fixture_set();
    let balance = set.consolidate_values(StatementKind::Balance).unwrap();
    let equity = set.consolidate_values(StatementKind::Equity).unwrap();
    let ratios = set.ratios().unwrap();
    let path = std::env::temp_dir().join(format!("smv-report-{}.xlsx", std::process::id()));
    write_workbook(
        &path,
        &[("values_balance", &balance), ("values_equity", &equity)],
        Some(&ratios),
    )
    .unwrap();

    let mut workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["values_balance", "values_equity", "ratios"]
    );

    let values = workbook.worksheet_range("values_balance").unwrap();
    assert_eq!(values.get_value((0, 0)), Some(&Data::String("Account".into())));
    assert_eq!(values.get_value((0, 1)), Some(&Data::String("2023".into())));
    let cash = values
        .rows()
        .find(|row| row[0] == Data::String("Efectivo y Equivalentes al Efectivo".into()))
        .unwrap();
    assert_eq!(cash[1].to_string(), "100,000");

    let codes = workbook.worksheet_range("values_equity").unwrap();
    assert_eq!(codes.get_value((0, 0)), Some(&Data::String("Code".into())));
    assert_eq!(codes.get_value((1, 0)), Some(&Data::String("3D0101".into())));

    let sheet = workbook.worksheet_range("ratios").unwrap();
    let current: Vec<String> = sheet
        .rows()
        .nth(1)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        current,
        vec!["Current ratio", "Liquidity", "1.58", "1.80", "1.58", "1.80", "1.69"]
    );

    std::fs::remove_file(&path).unwrap();
}
