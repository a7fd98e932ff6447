//! HTML expansion of the discharge summary layout.

use records::{DischargeSummaryRecord, NarrativeField, PatientRecord};
use std::fmt::Write;

/// Path of the summary stylesheet below the static prefix.
pub const STYLESHEET_PATH: &str = "css/discharge_summary.css";

/// Path of the hospital logo below the static prefix.
pub const LOGO_PATH: &str = "img/logo.png";

const DATE_FORMAT: &str = "%d %b %Y";

/// Escapes text for use in element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escapes multi-line text, turning each line break into `<br>`.
fn escape_multiline(text: &str) -> String {
    text.lines()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br>")
}

fn optional(value: &Option<String>) -> String {
    value.as_deref().map(escape_html).unwrap_or_default()
}

/// Expands the fixed discharge summary layout into a complete HTML document.
///
/// `static_url` is the public prefix of static assets (normally `/static/`). Optional fields
/// that were not provided render as empty strings.
pub fn expand_discharge_summary(
    patient: &PatientRecord,
    summary: &DischargeSummaryRecord,
    static_url: &str,
) -> String {
    let static_url = static_url.trim_end_matches('/');
    let mut html = String::with_capacity(4096);

    // Writing to a String cannot fail.
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Discharge Summary - {name}</title>\n\
         <link rel=\"stylesheet\" href=\"{static_url}/{STYLESHEET_PATH}\">\n\
         </head>\n<body>\n\
         <div class=\"header\">\n\
         <img class=\"logo\" src=\"{static_url}/{LOGO_PATH}\" alt=\"Hospital logo\">\n\
         <h1>Discharge Summary</h1>\n\
         </div>\n",
        name = escape_html(patient.name.as_str()),
    );

    let rows: [(&str, String); 12] = [
        ("Patient Name", escape_html(patient.name.as_str())),
        ("Patient ID", escape_html(&patient.patient_id.to_string())),
        (
            "Age / Gender",
            format!("{} yrs / {}", patient.age, patient.gender),
        ),
        ("UHID", escape_html(summary.uhid.as_str())),
        ("IP ID", optional(&summary.ip_id)),
        ("Ward", optional(&summary.ward)),
        ("Bed No", optional(&summary.bed_no)),
        ("Consultant", escape_html(summary.consultant_name.as_str())),
        (
            "Admission Date",
            summary.admission_date.format(DATE_FORMAT).to_string(),
        ),
        (
            "Discharge Date",
            summary.discharge_date.format(DATE_FORMAT).to_string(),
        ),
        (
            "Length of Stay",
            format!("{} days", summary.length_of_stay_days()),
        ),
        ("Discharge Type", summary.discharge_type.label().to_string()),
    ];

    html.push_str("<table class=\"details\">\n");
    for (label, value) in rows {
        let _ = writeln!(html, "<tr><th>{label}</th><td>{value}</td></tr>");
    }
    html.push_str("</table>\n<hr>\n");

    for field in NarrativeField::ALL {
        let text = summary
            .narrative(field)
            .map(escape_multiline)
            .unwrap_or_default();
        let _ = writeln!(
            html,
            "<div class=\"section\">\n<h2>{}</h2>\n<p>{text}</p>\n</div>",
            field.label()
        );
    }

    let _ = write!(
        html,
        "<hr>\n<p class=\"signature\">Consultant: {}</p>\n</body>\n</html>\n",
        escape_html(summary.consultant_name.as_str())
    );

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bare_summary, patient};
    use records::NonEmptyText;

    #[test]
    fn test_escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"A&B"</b> 'x'"#),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt; &#39;x&#39;"
        );
    }

    #[test]
    fn test_expansion_links_stylesheet_and_logo() {
        let patient = patient(1);
        let summary = bare_summary(&patient);

        let html = expand_discharge_summary(&patient, &summary, "/static/");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"href="/static/css/discharge_summary.css""#));
        assert!(html.contains(r#"src="/static/img/logo.png""#));
        assert!(html.contains("<tr><th>Patient ID</th><td>PO00001</td></tr>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_absent_fields_render_empty_and_sections_keep_order() {
        let patient = patient(1);
        let summary = bare_summary(&patient);

        let html = expand_discharge_summary(&patient, &summary, "/static/");

        assert!(html.contains("<tr><th>Ward</th><td></td></tr>"));
        assert!(html.contains("<h2>Diet Advice</h2>\n<p></p>"));

        let positions: Vec<usize> = NarrativeField::ALL
            .iter()
            .map(|f| html.find(&format!("<h2>{}</h2>", f.label())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_narrative_is_escaped_and_line_breaks_become_br() {
        let patient = patient(1);
        let mut summary = bare_summary(&patient);
        summary.final_diagnosis = NonEmptyText::new("Sepsis <resolved>").unwrap();
        summary.hospital_course = Some("Day 1: IV antibiotics\nDay 3: afebrile".into());

        let html = expand_discharge_summary(&patient, &summary, "/static/");

        assert!(html.contains("<p>Sepsis &lt;resolved&gt;</p>"));
        assert!(html.contains("<p>Day 1: IV antibiotics<br>Day 3: afebrile</p>"));
    }
}
