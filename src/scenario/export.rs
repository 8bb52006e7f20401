use std::io::Write;

use super::{Comparison, RowFormat};

/// Formats as pounds with thousands separators, e.g. `£12,345.67` or `-£900`.
pub fn format_currency(value: f64, decimals: usize) -> String {
    let digits = format!("{:.*}", decimals, value.abs());
    let negative = value < 0.0 && digits.bytes().any(|b| matches!(b, b'1'..=b'9'));

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('£');
    out.push_str(&grouped);
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn format_row_value(value: f64, format: RowFormat) -> String {
    match format {
        RowFormat::Whole => format_currency(value, 0),
        RowFormat::Pence => format_currency(value, 2),
    }
}

/// Writes `Metric,<label A>,<label B>` followed by one row per breakdown metric.
pub fn write_comparison_csv<W: Write>(
    comparison: &Comparison,
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Metric", comparison.a.label.as_str(), comparison.b.label.as_str()])?;
    for row in comparison.rows() {
        csv.write_record([
            row.metric.to_string(),
            format_row_value(row.a, row.format),
            format_row_value(row.b, row.format),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CalculationInput;
    use crate::scenario::{Baseline, Scenario};

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0, 2), "£0.00");
        assert_eq!(format_currency(999.0, 0), "£999");
        assert_eq!(format_currency(1_000.0, 0), "£1,000");
        assert_eq!(format_currency(46_372.4, 2), "£46,372.40");
        assert_eq!(format_currency(1_234_567.891, 2), "£1,234,567.89");
    }

    #[test]
    fn currency_sign_is_dropped_when_rounding_to_zero() {
        assert_eq!(format_currency(-7_000.0, 0), "-£7,000");
        assert_eq!(format_currency(-0.001, 2), "£0.00");
    }

    #[test]
    fn csv_has_metric_header_and_quoted_currency_cells() {
        let input = CalculationInput {
            base_salary: 65_000.0,
            bonus: 0.0,
            employee_pension_pct: 5.0,
            employer_pension_pct: 3.0,
            pension_applies_to_bonus: true,
            ev_lease_monthly: 0.0,
            ev_p11d_value: 0.0,
            other_sacrifice_monthly: 0.0,
            num_children: 0,
        };
        let comparison = Comparison::new(
            Scenario::new("Scenario A", input.clone()),
            Scenario::new("Scenario B", input),
        );

        let mut buf = Vec::new();
        write_comparison_csv(&comparison, &mut buf).expect("csv write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Metric,Scenario A,Scenario B");
        assert_eq!(lines[1], "Gross Salary,\"£65,000\",\"£65,000\"");
        assert_eq!(lines[2], "Income Tax,\"£12,132\",\"£12,132\"");
        assert!(lines.contains(&"Annual Take Home,\"£46,372.40\",\"£46,372.40\""));
        assert_eq!(lines.len(), 1 + comparison.rows().len());
    }

    #[test]
    fn csv_uses_baseline_labels() {
        let input = CalculationInput {
            base_salary: 40_000.0,
            bonus: 0.0,
            employee_pension_pct: 0.0,
            employer_pension_pct: 0.0,
            pension_applies_to_bonus: false,
            ev_lease_monthly: 300.0,
            ev_p11d_value: 30_000.0,
            other_sacrifice_monthly: 0.0,
            num_children: 1,
        };
        let comparison = Comparison::against_baseline(&input, Baseline::NoEv);
        let mut buf = Vec::new();
        write_comparison_csv(&comparison, &mut buf).expect("csv write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("Metric,Without EV,With EV\n"));
    }
}
