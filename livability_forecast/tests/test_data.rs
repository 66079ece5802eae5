use livability_forecast::data::{
    coerce_numeric, parse_year, DataLoader, NumericParse, RowIssueKind, YearParse,
};
use livability_forecast::ForecastError;
use livability_math::Category;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "geo_label_citystate,date_label,strata_race_label,strata_sex_label,\
Housing,Transportation,Environment,Health,Neighborhood,Engagement,Opportunity";

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_data_loader_from_csv() {
    let file = csv_file(&[
        HEADER,
        "\"Springfield, IL\",2020,All,Both,0.1,0.2,0.3,0.4,0.5,0.6,0.7",
        "\"Springfield, IL\",2020,Black,Female,0.2,0.2,0.3,0.4,0.5,0.6,0.7",
        "\"Shelbyville, IL\",2021,All,Both,0.5,0.5,0.5,0.5,0.5,0.5,0.5",
    ]);

    let table = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(table.len(), 3);
    assert!(table.issues().is_empty());
    assert_eq!(table.aggregate_records().count(), 2);

    let first = &table.records()[0];
    assert_eq!(first.city, "Springfield, IL");
    assert_eq!(first.year, 2020);
    assert_eq!(first.values[Category::Opportunity], 0.7);
}

#[test]
fn test_data_loader_drops_bad_rows() {
    let file = csv_file(&[
        HEADER,
        "Springfield,2020,All,Both,0.1,0.2,0.3,0.4,0.5,0.6,0.7",
        "Springfield,2021,All,Both,n/a,0.2,0.3,0.4,0.5,0.6,0.7",
        "Springfield,2022,All,Both,0.3,,0.3,0.4,0.5,0.6,0.7",
        "Springfield,someday,All,Both,0.3,0.2,0.3,0.4,0.5,0.6,0.7",
        ",2023,All,Both,0.3,0.2,0.3,0.4,0.5,0.6,0.7",
    ]);

    let table = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.issues().len(), 4);

    let kinds: Vec<(usize, &str, &RowIssueKind)> = table
        .issues()
        .iter()
        .map(|issue| (issue.row, issue.column.as_str(), &issue.kind))
        .collect();
    assert_eq!(
        kinds[0],
        (
            1,
            "Housing",
            &RowIssueKind::NonNumeric {
                value: "n/a".to_string()
            }
        )
    );
    assert_eq!(kinds[1], (2, "Transportation", &RowIssueKind::Missing));
    assert_eq!(
        kinds[2],
        (
            3,
            "date_label",
            &RowIssueKind::UnparsableYear {
                value: "someday".to_string()
            }
        )
    );
    assert_eq!(kinds[3], (4, "geo_label_citystate", &RowIssueKind::Missing));
}

#[test]
fn test_data_loader_date_labels_and_fallback_columns() {
    let file = csv_file(&[
        "City,Year,strata_race_label,strata_sex_label,\
Housing,Transportation,Environment,Health,Neighborhood,Engagement,Opportunity",
        "Ogdenville,2019-01-01,All,Both,0.1,0.2,0.3,0.4,0.5,0.6,0.7",
        "Ogdenville,2020-01-01,All,Both,0.2,0.2,0.3,0.4,0.5,0.6,0.7",
    ]);

    let table = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.year_fallbacks(), 2);
    assert_eq!(table.records()[1].year, 2020);
    assert_eq!(table.records()[1].city, "Ogdenville");
}

#[test]
fn test_data_loader_error_handling() {
    assert!(DataLoader::from_csv("nonexistent_file.csv").is_err());

    let file = csv_file(&[
        "geo_label_citystate,date_label,strata_race_label,strata_sex_label,Housing",
        "Springfield,2020,All,Both,0.1",
    ]);
    match DataLoader::from_csv(file.path()) {
        Err(ForecastError::MissingColumn(column)) => assert_eq!(column, "Transportation"),
        other => panic!("expected MissingColumn, got {:?}", other),
    }
}

#[rstest]
#[case("2020", YearParse::Integer(2020))]
#[case(" 1999 ", YearParse::Integer(1999))]
#[case("2020.0", YearParse::Integer(2020))]
#[case("2018-06-30", YearParse::DateFallback(2018))]
#[case("06/30/2017", YearParse::DateFallback(2017))]
#[case("2016-03-01T00:00:00Z", YearParse::DateFallback(2016))]
#[case("next year", YearParse::Failed)]
fn test_parse_year(#[case] raw: &str, #[case] expected: YearParse) {
    assert_eq!(parse_year(raw), expected);
}

#[rstest]
#[case(Some("0.25"), NumericParse::Value(0.25))]
#[case(Some(" 1 "), NumericParse::Value(1.0))]
#[case(Some(""), NumericParse::Missing)]
#[case(Some("NaN"), NumericParse::Missing)]
#[case(None, NumericParse::Missing)]
#[case(Some("inf"), NumericParse::NonNumeric("inf".to_string()))]
#[case(Some("high"), NumericParse::NonNumeric("high".to_string()))]
fn test_coerce_numeric(#[case] raw: Option<&str>, #[case] expected: NumericParse) {
    assert_eq!(coerce_numeric(raw), expected);
}
