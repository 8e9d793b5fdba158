use chrono::{Datelike, NaiveDate};

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Long Spanish date as shown in screen headers: `5 de marzo de 2024`.
pub fn format_long_date_es(date: NaiveDate) -> String {
    let month = MONTHS_ES[date.month0() as usize];
    format!("{} de {} de {}", date.day(), month, date.year())
}

/// Wire format for date-scoped queries.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_long_date() {
        assert_eq!(format_long_date_es(date(2024, 3, 5)), "5 de marzo de 2024");
        assert_eq!(
            format_long_date_es(date(2023, 12, 31)),
            "31 de diciembre de 2023"
        );
        assert_eq!(format_long_date_es(date(2025, 1, 1)), "1 de enero de 2025");
    }

    #[test]
    fn test_iso_round_trip() {
        assert_eq!(format_iso_date(date(2024, 3, 5)), "2024-03-05");
        assert_eq!(parse_iso_date(" 2024-03-05 ").unwrap(), date(2024, 3, 5));
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        assert!(parse_iso_date("05/03/2024").is_err());
        assert!(parse_iso_date("2024-13-01").is_err());
        assert!(parse_iso_date("").is_err());
    }
}
