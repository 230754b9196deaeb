use crate::models::JournalData;
use chrono::NaiveDate;

pub fn render_index(today: NaiveDate, data: &JournalData) -> String {
    INDEX_HTML
        .replace("{{TODAY}}", &today.to_string())
        .replace("{{CATEGORIES}}", &data.categories.len().to_string())
        .replace("{{POINTS}}", &data.points.len().to_string())
        .replace("{{RATINGS}}", &data.ratings.len().to_string())
        .replace("{{TRASH}}", &data.deleted_points.len().to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Life Journal</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f3f6ee;
      --bg-2: #cfe3c4;
      --ink: #24302a;
      --accent: #4caf50;
      --muted: #6b7a70;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(36, 48, 42, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #eef5e6 60%, #f7faf4 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(920px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", serif;
      margin: 0;
      font-size: 2.2rem;
    }

    .counts {
      display: flex;
      gap: 18px;
      flex-wrap: wrap;
      color: var(--muted);
    }

    .counts strong {
      color: var(--ink);
    }

    .bar-row {
      display: grid;
      grid-template-columns: 160px 1fr 72px;
      align-items: center;
      gap: 12px;
      margin: 6px 0;
    }

    .bar {
      height: 14px;
      border-radius: 7px;
      background: var(--accent);
    }

    .muted {
      color: var(--muted);
    }

    select {
      font: inherit;
      padding: 6px 10px;
      border-radius: 10px;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Life Journal</h1>
      <div class="counts">
        <span>Today <strong>{{TODAY}}</strong></span>
        <span><strong>{{CATEGORIES}}</strong> categories</span>
        <span><strong>{{POINTS}}</strong> points</span>
        <span><strong>{{RATINGS}}</strong> ratings</span>
        <span><strong>{{TRASH}}</strong> in trash</span>
      </div>
    </header>

    <section>
      <label for="period">Period</label>
      <select id="period">
        <option value="week">Last week</option>
        <option value="month">Last month</option>
        <option value="year">Last year</option>
        <option value="all">All time</option>
      </select>
      <p id="summary" class="muted"></p>
    </section>

    <section>
      <h2>Points</h2>
      <div id="points"></div>
    </section>

    <section>
      <h2>Life wheel</h2>
      <div id="categories"></div>
    </section>

    <section>
      <h2>Weekly trend</h2>
      <div id="trend"></div>
    </section>

    <section>
      <h2>Deleted points</h2>
      <div id="deleted"></div>
    </section>
  </main>

  <script>
    const bars = (target, rows) => {
      const el = document.getElementById(target);
      if (rows.length === 0) {
        el.innerHTML = '<p class="muted">No ratings for this period.</p>';
        return;
      }
      el.innerHTML = rows.map((row) => `
        <div class="bar-row">
          <span>${row.label}</span>
          <div class="bar" style="width: ${row.value * 10}%; background: ${row.color || 'var(--accent)'}"></div>
          <span>${row.value.toFixed(1)} (${row.count})</span>
        </div>`).join('');
    };

    const load = async () => {
      const period = document.getElementById('period').value;
      const res = await fetch(`/api/stats?period=${period}`);
      if (!res.ok) {
        throw new Error(await res.text());
      }
      const stats = await res.json();
      const colors = Object.fromEntries(stats.categories.map((c) => [c.category.id, c.category.color]));

      bars('points', stats.points.map((p) => ({
        label: p.point.name, value: p.average, count: p.count, color: colors[p.point.categoryId]
      })));
      bars('categories', stats.categories.filter((c) => c.count > 0).map((c) => ({
        label: c.category.name, value: c.average, count: c.count, color: c.category.color
      })));
      bars('trend', stats.trend.map((t) => ({ label: t.label, value: t.average, count: t.days })));
      bars('deleted', stats.deleted.map((p) => ({ label: p.point.name, value: p.average, count: p.count })));

      const s = stats.summary;
      document.getElementById('summary').textContent =
        `${s.range.start} to ${s.range.end}: ${s.total_points} points, ${s.total_entries} entries, ` +
        `overall ${s.overall_average.toFixed(1)}/10`;
    };

    document.getElementById('period').addEventListener('change', () => {
      load().catch((err) => console.error(err));
    });

    load().catch((err) => console.error(err));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_fills_placeholders() {
        let html = render_index(
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            &JournalData::default(),
        );
        assert!(html.contains("<strong>2024-01-03</strong>"));
        assert!(html.contains("<strong>0</strong> ratings"));
        assert!(!html.contains("{{"));
    }
}
