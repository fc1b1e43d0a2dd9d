//! HTML rendering for the fortunes page.

use std::fmt::Write;

use crate::world::Fortune;

/// Appended to every listing before sorting.
pub const REQUEST_TIME_FORTUNE: &str = "Additional fortune added at request time.";

/// Adds the request-time fortune and sorts by message.
pub fn prepare(mut fortunes: Vec<Fortune>) -> Vec<Fortune> {
    fortunes.push(Fortune::new(0, REQUEST_TIME_FORTUNE));
    fortunes.sort_by(|a, b| a.message.cmp(&b.message));
    fortunes
}

/// Renders the fortunes table. Messages are HTML-escaped.
pub fn render(fortunes: &[Fortune]) -> String {
    let mut html = String::with_capacity(128 + fortunes.len() * 64);
    html.push_str(
        "<!DOCTYPE html><html><head><title>Fortunes</title></head><body>\
         <table><tr><th>id</th><th>message</th></tr>",
    );
    for fortune in fortunes {
        // Writing into a String cannot fail.
        let _ = write!(html, "<tr><td>{}</td><td>", fortune.id);
        escape_into(&mut html, &fortune.message);
        html.push_str("</td></tr>");
    }
    html.push_str("</table></body></html>");
    html
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_adds_request_time_fortune_and_sorts() {
        let fortunes = prepare(vec![
            Fortune::new(1, "fortune: No such file or directory"),
            Fortune::new(2, "A computer scientist is someone who fixes things that aren't broken."),
        ]);
        let messages: Vec<&str> = fortunes.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, [
            "A computer scientist is someone who fixes things that aren't broken.",
            REQUEST_TIME_FORTUNE,
            "fortune: No such file or directory",
        ]);
        assert_eq!(fortunes[1].id, 0);
    }

    #[test]
    fn render_escapes_markup() {
        let html = render(&[Fortune::new(7, "<script>alert(\"x\") & 'y'</script>")]);
        assert!(html.contains(
            "<tr><td>7</td><td>&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;</td></tr>"
        ));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</table></body></html>"));
    }
}
