use chrono::NaiveDate;

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} – {}", format_date(start), format_date(end))
}

pub fn format_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
