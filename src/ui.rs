use crate::filter::StatusFilter;
use crate::models::{ClassifiedProduct, Notice};
use crate::status::Status;
use chrono::NaiveDate;
use std::fmt::Write;

pub struct IndexPage<'a> {
    pub today: NaiveDate,
    pub total_score: u64,
    pub awarded_today: bool,
    pub table_len: usize,
    pub rows: &'a [ClassifiedProduct],
    pub filter: &'a StatusFilter,
    pub notice: Option<Notice>,
}

pub fn render_index(page: &IndexPage<'_>) -> String {
    INDEX_HTML
        .replace("{{TODAY}}", &page.today.to_string())
        .replace("{{TOTAL_SCORE}}", &page.total_score.to_string())
        .replace("{{AWARD}}", &render_award(page.awarded_today))
        .replace("{{NOTICE}}", &render_notice(page.notice))
        .replace("{{TABLE_LEN}}", &page.table_len.to_string())
        .replace("{{SHOWN}}", &page.rows.len().to_string())
        .replace("{{FILTERS}}", &render_filters(page.filter))
        .replace("{{FILTER_QUERY}}", &page.filter.to_query())
        .replace("{{ROWS}}", &render_rows(page.rows))
}

fn render_award(awarded_today: bool) -> String {
    if awarded_today {
        r#"<p class="award">+10 points for checking in today!</p>"#.to_string()
    } else {
        String::new()
    }
}

fn render_notice(notice: Option<Notice>) -> String {
    match notice {
        Some(notice) => format!(
            r#"<div class="status" data-type="{}">{}</div>"#,
            if notice.is_error() { "error" } else { "ok" },
            notice.message()
        ),
        None => String::new(),
    }
}

fn render_filters(filter: &StatusFilter) -> String {
    let mut html = String::new();
    for status in Status::ALL {
        let _ = write!(
            html,
            r#"<label class="chip"><input type="checkbox" value="{slug}"{checked} /><span class="dot" style="background:{color}"></span>{label}</label>"#,
            slug = status.slug(),
            checked = if filter.contains(status) { " checked" } else { "" },
            color = status.color(),
            label = status.label(),
        );
    }
    html
}

fn render_rows(rows: &[ClassifiedProduct]) -> String {
    if rows.is_empty() {
        return r#"<tr><td colspan="4" class="empty">No data to display.</td></tr>"#.to_string();
    }

    let mut html = String::new();
    for row in rows {
        let _ = write!(
            html,
            r#"<tr><td>{index}</td><td>{barcode}</td><td>{date}</td><td><span class="badge" style="background:{color}">{status}</span></td></tr>"#,
            index = row.index,
            barcode = escape_html(&row.barcode),
            date = row.expiration_date,
            color = row.color,
            status = row.status,
        );
    }
    html
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
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

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Product Expiration Dashboard</title>
  <style>
    :root {
      --bg: #f4f6f3;
      --ink: #23272a;
      --muted: #6b7075;
      --accent: #2f4858;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(47, 72, 88, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
    }

    .layout {
      display: grid;
      grid-template-columns: 280px 1fr;
      min-height: 100vh;
    }

    aside {
      background: var(--accent);
      color: white;
      padding: 28px 22px;
      display: grid;
      align-content: start;
      gap: 26px;
    }

    aside h2 {
      margin: 0 0 10px;
      font-size: 1.05rem;
      letter-spacing: 0.04em;
    }

    aside form {
      display: grid;
      gap: 10px;
    }

    aside input[type="text"],
    aside input[type="date"],
    aside input[type="number"] {
      padding: 10px 12px;
      border-radius: 10px;
      border: none;
      font-size: 0.95rem;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 11px 16px;
      font-weight: 600;
      cursor: pointer;
      background: #ff6b4a;
      color: white;
    }

    .chip {
      display: flex;
      align-items: center;
      gap: 8px;
      font-size: 0.95rem;
    }

    .dot {
      width: 12px;
      height: 12px;
      border-radius: 50%;
      display: inline-block;
    }

    main {
      padding: 32px;
      display: grid;
      align-content: start;
      gap: 24px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 3vw, 2.3rem);
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(170px, 1fr));
      gap: 14px;
    }

    .stat,
    .card {
      background: var(--card);
      border-radius: 18px;
      padding: 18px;
      box-shadow: var(--shadow);
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    .stat .value {
      display: block;
      margin-top: 6px;
      font-size: 1.6rem;
      font-weight: 600;
      color: var(--accent);
    }

    .award {
      margin: 0;
      font-weight: 600;
      color: #09b96d;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    .columns {
      display: grid;
      grid-template-columns: 3fr 2fr;
      gap: 20px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th,
    td {
      text-align: left;
      padding: 9px 8px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    .badge {
      padding: 3px 10px;
      border-radius: 999px;
      font-size: 0.85rem;
      color: #23272a;
    }

    .empty {
      color: var(--muted);
      text-align: center;
    }

    svg {
      width: 100%;
      display: block;
    }

    .chart-label {
      fill: var(--muted);
      font-size: 11px;
    }

    @media (max-width: 860px) {
      .layout,
      .columns {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <div class="layout">
    <aside>
      <section>
        <h2>Add product</h2>
        <form method="post" action="/products">
          <input type="text" name="barcode" placeholder="Barcode" />
          <input type="date" name="expiration_date" />
          <input type="hidden" name="status" value="{{FILTER_QUERY}}" />
          <button type="submit">Add product</button>
        </form>
      </section>

      <section>
        <h2>Remove product</h2>
        <form method="post" action="/products/delete">
          <input type="number" name="index" min="0" placeholder="Row index" />
          <input type="hidden" name="status" value="{{FILTER_QUERY}}" />
          <button type="submit">Remove</button>
        </form>
      </section>

      <section>
        <h2>Filter by status</h2>
        <form id="filter-form" method="get" action="/">
          {{FILTERS}}
          <input type="hidden" name="status" id="filter-status" value="{{FILTER_QUERY}}" />
          <button type="submit">Apply filter</button>
        </form>
      </section>

      <section>
        <h2>Export</h2>
        <form method="post" action="/export">
          <input type="hidden" name="status" value="{{FILTER_QUERY}}" />
          <button type="submit">Export filtered view to CSV</button>
        </form>
      </section>
    </aside>

    <main>
      <header>
        <h1>Product Expiration Dashboard</h1>
        {{AWARD}}
        {{NOTICE}}
      </header>

      <section class="panel">
        <div class="stat">
          <span class="label">Today</span>
          <span class="value">{{TODAY}}</span>
        </div>
        <div class="stat">
          <span class="label">Products</span>
          <span class="value">{{SHOWN}} / {{TABLE_LEN}}</span>
        </div>
        <div class="stat">
          <span class="label">Total score</span>
          <span class="value" id="total-score">{{TOTAL_SCORE}}</span>
        </div>
      </section>

      <section class="columns">
        <div class="card">
          <h2>Filtered products</h2>
          <table>
            <thead>
              <tr><th>#</th><th>Barcode</th><th>Expiration date</th><th>Status</th></tr>
            </thead>
            <tbody>
              {{ROWS}}
            </tbody>
          </table>
        </div>
        <div class="card">
          <h2>Products by status</h2>
          <svg id="pie" viewBox="0 0 240 240" role="img" aria-label="Products by status"></svg>
        </div>
      </section>

      <section class="card">
        <h2>Daily score</h2>
        <svg id="bars" viewBox="0 0 600 220" role="img" aria-label="Score per day"></svg>
      </section>
    </main>
  </div>

  <script>
    const pieEl = document.getElementById('pie');
    const barsEl = document.getElementById('bars');
    const filterForm = document.getElementById('filter-form');
    const filterStatus = document.getElementById('filter-status');

    filterForm.addEventListener('submit', () => {
      const checked = Array.from(filterForm.querySelectorAll('input[type="checkbox"]:checked'))
        .map((input) => input.value);
      filterStatus.value = checked.length ? checked.join(',') : 'none';
    });

    const renderPie = (slices) => {
      const total = slices.reduce((sum, slice) => sum + slice.count, 0);
      if (!total) {
        pieEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }

      const cx = 120;
      const cy = 120;
      const r = 100;
      const hole = 30;
      let angle = -Math.PI / 2;
      let paths = '';
      slices.forEach((slice) => {
        const sweep = (slice.count / total) * Math.PI * 2;
        if (slice.count === total) {
          paths += `<circle cx="${cx}" cy="${cy}" r="${r}" fill="${slice.color}" />`;
        } else {
          const x1 = cx + r * Math.cos(angle);
          const y1 = cy + r * Math.sin(angle);
          const x2 = cx + r * Math.cos(angle + sweep);
          const y2 = cy + r * Math.sin(angle + sweep);
          const large = sweep > Math.PI ? 1 : 0;
          paths += `<path d="M ${cx} ${cy} L ${x1} ${y1} A ${r} ${r} 0 ${large} 1 ${x2} ${y2} Z" fill="${slice.color}"><title>${slice.status}: ${slice.count}</title></path>`;
        }
        angle += sweep;
      });
      paths += `<circle cx="${cx}" cy="${cy}" r="${hole}" fill="white" />`;
      pieEl.innerHTML = paths;
    };

    const renderBars = (days) => {
      if (!days.length) {
        barsEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }

      const width = 600;
      const height = 220;
      const padding = 30;
      const max = Math.max(10, ...days.map((day) => day.score));
      const slot = (width - padding * 2) / days.length;
      const barWidth = Math.max(2, slot * 0.7);
      const labelEvery = Math.ceil(days.length / 10);

      barsEl.innerHTML = days
        .map((day, index) => {
          const h = ((height - padding * 2) * day.score) / max;
          const x = padding + index * slot;
          const y = height - padding - h;
          const label = index % labelEvery === 0
            ? `<text class="chart-label" x="${x + barWidth / 2}" y="${height - 10}" text-anchor="middle">${day.date.slice(5)}</text>`
            : '';
          return `<rect x="${x}" y="${y}" width="${barWidth}" height="${h}" rx="3" fill="#2f4858"><title>${day.date}: ${day.score}</title></rect>${label}`;
        })
        .join('');
    };

    const loadStats = async () => {
      const params = new URLSearchParams(window.location.search);
      const status = params.get('status') || '';
      const res = await fetch(`/api/stats?status=${encodeURIComponent(status)}`);
      if (!res.ok) {
        throw new Error('Unable to load stats');
      }
      const stats = await res.json();
      renderPie(stats.distribution);
      renderBars(stats.daily_scores);
    };

    loadStats().catch(() => {
      pieEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">Stats unavailable</text>';
    });
  </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    #[test]
    fn index_escapes_barcodes_and_marks_award() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let product = Product {
            barcode: "<b>789</b>".to_string(),
            expiration_date: today,
        };
        let rows = vec![ClassifiedProduct::new(0, &product, today)];
        let filter = StatusFilter::all();
        let html = render_index(&IndexPage {
            today,
            total_score: 30,
            awarded_today: true,
            table_len: 1,
            rows: &rows,
            filter: &filter,
            notice: Some(Notice::InvalidIndex),
        });

        assert!(html.contains("&lt;b&gt;789&lt;/b&gt;"));
        assert!(!html.contains("<b>789</b>"));
        assert!(html.contains("Near Expiration"));
        assert!(html.contains("+10 points"));
        assert!(html.contains("Invalid index or empty table."));
        assert!(html.contains(r#"value="expired,near_expiration,within_range""#));
    }

    #[test]
    fn empty_table_shows_placeholder() {
        let filter = StatusFilter::only([Status::Expired]);
        let html = render_index(&IndexPage {
            today: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            total_score: 0,
            awarded_today: false,
            table_len: 0,
            rows: &[],
            filter: &filter,
            notice: None,
        });

        assert!(html.contains("No data to display."));
        assert!(!html.contains("+10 points"));
    }

    #[test]
    fn every_form_carries_the_active_filter() {
        let filter = StatusFilter::only([Status::NearExpiration]);
        let html = render_index(&IndexPage {
            today: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            total_score: 0,
            awarded_today: false,
            table_len: 0,
            rows: &[],
            filter: &filter,
            notice: None,
        });

        let hidden = r#"name="status" value="near_expiration""#;
        // add, delete, export
        assert_eq!(html.matches(&format!(r#"<input type="hidden" {hidden} />"#)).count(), 3);
        assert!(html.contains(r#"id="filter-status" value="near_expiration""#));
    }
}
