//! Embedded HTML/CSS/JS frontend for the lifetrack web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies. All state lives
//! server-side in the page controller; the page only renders what the JSON
//! endpoints return.

/// The complete single-page app HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>lifetrack</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --cyan: #39d2c0;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }
header .user { color: var(--text-muted); font-size: 13px; display: flex; gap: 12px; align-items: center; }

nav {
  display: flex;
  gap: 4px;
  margin-bottom: 24px;
  background: var(--surface);
  border-radius: var(--radius);
  padding: 4px;
  border: 1px solid var(--border);
}
nav button {
  flex: 1;
  padding: 8px 16px;
  border: none;
  border-radius: 6px;
  background: transparent;
  color: var(--text-muted);
  font-size: 13px;
  font-weight: 500;
  cursor: pointer;
}
nav button:hover { color: var(--text); background: rgba(255,255,255,0.04); }
nav button.active { background: var(--accent); color: #fff; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }
.card h3 { font-size: 14px; font-weight: 600; margin-bottom: 12px; color: var(--text-muted); }

.toolbar { display: flex; gap: 12px; align-items: flex-end; flex-wrap: wrap; margin-bottom: 16px; }
.field { display: flex; flex-direction: column; gap: 4px; }
.field label { font-size: 12px; color: var(--text-muted); }
input, select, textarea {
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: 6px;
  color: var(--text);
  padding: 6px 10px;
  font-size: 13px;
  font-family: var(--font);
}
input:focus, select:focus, textarea:focus { outline: none; border-color: var(--accent); }
input:invalid { border-color: var(--red); }

.stats-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 16px;
  margin-bottom: 24px;
}
.stat-card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  text-align: center;
}
.stat-card .title { font-size: 12px; color: var(--text-muted); text-transform: uppercase; letter-spacing: 0.5px; }
.stat-card .value { font-size: 32px; font-weight: 700; font-family: var(--mono); color: var(--accent); line-height: 1.2; }
.stat-card .unit { font-size: 14px; color: var(--text-muted); margin-left: 4px; }
.stat-card .range { font-size: 12px; color: var(--text-muted); margin-top: 6px; font-family: var(--mono); }

.ranges { display: flex; gap: 4px; }
.ranges button {
  padding: 6px 12px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--surface);
  color: var(--text-muted);
  cursor: pointer;
  font-size: 12px;
}
.ranges button.active { border-color: var(--accent); color: var(--accent); }

.chart svg { width: 100%; height: 220px; }
.chart .line { fill: none; stroke: var(--accent); stroke-width: 2; }
.chart .dot { fill: var(--accent); }
.chart .axis { stroke: var(--border); }
.chart text { fill: var(--text-muted); font-size: 10px; font-family: var(--mono); }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); vertical-align: top; }
th { color: var(--text-muted); font-weight: 500; font-size: 12px; text-transform: uppercase; letter-spacing: 0.5px; }
td.mono { font-family: var(--mono); font-size: 12px; }
td .note { color: var(--text-muted); font-style: italic; }
tr:hover { background: rgba(255,255,255,0.02); }

.def-row { display: grid; grid-template-columns: repeat(7, 1fr) auto; gap: 6px; margin-bottom: 6px; }
.def-row input { width: 100%; }
.fields { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 12px; margin: 12px 0; }

.btn {
  display: inline-flex;
  align-items: center;
  gap: 6px;
  padding: 8px 16px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--surface);
  color: var(--text);
  font-size: 13px;
  cursor: pointer;
}
.btn:hover { border-color: var(--accent); color: var(--accent); }
.btn:disabled { opacity: 0.4; cursor: default; }
.btn.primary { background: var(--accent); color: #fff; border-color: var(--accent); }
.btn.danger { border-color: var(--red); color: var(--red); }
.btn-group { display: flex; gap: 8px; margin-top: 16px; }

.toast {
  position: fixed;
  bottom: 24px;
  right: 24px;
  padding: 12px 20px;
  border-radius: var(--radius);
  background: var(--green);
  color: #fff;
  font-weight: 500;
  font-size: 13px;
  transform: translateY(80px);
  opacity: 0;
  transition: all 0.3s;
  z-index: 1000;
}
.toast.show { transform: translateY(0); opacity: 1; }
.toast.error { background: var(--red); }

.panel { display: none; }
.panel.active { display: block; }
.hidden { display: none !important; }

.empty { text-align: center; padding: 40px 20px; color: var(--text-muted); }

.login { max-width: 360px; margin: 80px auto; }
.login .field { margin-bottom: 12px; }
.login input { width: 100%; }

@media (max-width: 768px) {
  .def-row { grid-template-columns: 1fr 1fr; }
  nav { flex-wrap: wrap; }
}
</style>
</head>
<body>
<div class="app">

  <header>
    <h1><span class="logo">lifetrack</span></h1>
    <div class="user hidden" id="user-box">
      <span id="user-name"></span>
      <button class="btn" id="logout-btn">Log out</button>
    </div>
  </header>

  <!-- Login -->
  <div class="card login hidden" id="login-panel">
    <h2>Log in</h2>
    <form id="login-form">
      <div class="field"><label for="login-user">Username</label><input id="login-user" required autocomplete="username"></div>
      <div class="field"><label for="login-pass">Password</label><input id="login-pass" type="password" required autocomplete="current-password"></div>
      <button class="btn primary" type="submit">Log in</button>
    </form>
  </div>

  <div id="main" class="hidden">
    <nav id="nav">
      <button class="active" data-page="dashboard">Dashboard</button>
      <button data-page="measurements">Measurements</button>
      <button data-page="templates">Templates</button>
    </nav>

    <!-- Dashboard -->
    <div class="panel active" id="panel-dashboard">
      <div class="toolbar">
        <div class="field"><label for="dash-template">Template</label><select id="dash-template"></select></div>
        <div class="field"><label>Time range</label><div class="ranges" id="dash-ranges"></div></div>
      </div>
      <div class="stats-grid" id="dash-cards"></div>
      <div id="dash-charts"></div>
      <div class="empty" id="dash-empty">Select a template to see statistics.</div>
    </div>

    <!-- Measurements -->
    <div class="panel" id="panel-measurements">
      <div class="card">
        <div class="toolbar">
          <div class="field"><label for="filter-template">Template</label><select id="filter-template"></select></div>
          <div class="field"><label for="filter-start">From</label><input type="date" id="filter-start"></div>
          <div class="field"><label for="filter-end">To</label><input type="date" id="filter-end"></div>
          <button class="btn primary" id="new-measurement-btn">New measurement</button>
        </div>
        <table>
          <thead><tr><th>Measured at</th><th>Template</th><th>Values</th></tr></thead>
          <tbody id="measurements-tbody"></tbody>
        </table>
        <div class="empty hidden" id="measurements-empty">No measurements in this range.</div>
      </div>

      <div class="card hidden" id="recorder">
        <h2>New measurement</h2>
        <form id="recorder-form">
          <div class="toolbar">
            <div class="field"><label for="rec-template">Template</label><select id="rec-template" required></select></div>
            <div class="field"><label for="rec-at">Measured at</label><input type="datetime-local" id="rec-at" required></div>
          </div>
          <div class="fields" id="rec-fields"></div>
          <div class="field"><label for="rec-notes">Notes</label><textarea id="rec-notes" rows="2"></textarea></div>
          <div class="btn-group">
            <button class="btn primary" type="submit">Save</button>
            <button class="btn" type="button" id="rec-cancel">Cancel</button>
          </div>
        </form>
      </div>
    </div>

    <!-- Templates -->
    <div class="panel" id="panel-templates">
      <div class="card">
        <div class="toolbar"><button class="btn primary" id="new-template-btn">New template</button></div>
        <table>
          <thead><tr><th>Name</th><th>Description</th><th>Values</th></tr></thead>
          <tbody id="templates-tbody"></tbody>
        </table>
        <div class="empty hidden" id="templates-empty">No templates yet.</div>
      </div>

      <div class="card hidden" id="editor">
        <h2>New template</h2>
        <form id="editor-form">
          <div class="toolbar">
            <div class="field"><label for="ed-name">Name</label><input id="ed-name" required></div>
            <div class="field"><label for="ed-desc">Description</label><input id="ed-desc"></div>
          </div>
          <h3>Values</h3>
          <div id="ed-rows"></div>
          <div class="btn-group">
            <button class="btn" type="button" id="ed-add">Add value</button>
            <button class="btn primary" type="submit">Create</button>
            <button class="btn" type="button" id="ed-cancel">Cancel</button>
          </div>
        </form>
      </div>
    </div>
  </div>
</div>

<div class="toast" id="toast"></div>

<script>
const ROW_FIELDS = [
  ['name', 'Name', true],
  ['display_name', 'Display name', true],
  ['unit_name', 'Unit', true],
  ['unit_display_name', 'Unit display', true],
  ['unit_description', 'Unit description', false],
  ['min_value', 'Min', false],
  ['max_value', 'Max', false],
];

let session = null;
let dashTemplate = '';
let dashDays = null;
// Per-view generation counters: a response is rendered only if no newer
// request for the same view started meanwhile.
const generations = { page: 0, dashboard: 0, measurements: 0, templates: 0 };

async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body !== undefined) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json().catch(() => ({}));
  if (res.status === 401) {
    showLogin();
    throw new Error(data.error || 'not logged in');
  }
  if (!res.ok) {
    throw new Error(data.detail ? `${data.error} (${data.detail})` : (data.error || res.statusText));
  }
  return data;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (isError ? ' error' : '');
  setTimeout(() => { el.className = 'toast'; }, 3000);
}

function esc(s) {
  const d = document.createElement('div');
  d.textContent = s == null ? '' : String(s);
  return d.innerHTML;
}

function localTime(iso) {
  const d = new Date(iso);
  return d.toLocaleString([], { year: 'numeric', month: '2-digit', day: '2-digit', hour: '2-digit', minute: '2-digit' });
}

// -- session ---------------------------------------------------------------

function showLogin() {
  session = null;
  document.getElementById('login-panel').classList.remove('hidden');
  document.getElementById('main').classList.add('hidden');
  document.getElementById('user-box').classList.add('hidden');
}

function applySession(s) {
  session = s;
  if (!s.logged_in) { showLogin(); return; }
  document.getElementById('login-panel').classList.add('hidden');
  document.getElementById('main').classList.remove('hidden');
  document.getElementById('user-box').classList.remove('hidden');
  document.getElementById('user-name').textContent = s.username || '';
  fillTemplateSelects(s.templates);
  dashDays = s.active_days;
  if (s.filter) {
    document.getElementById('filter-start').value = s.filter.start_date || '';
    document.getElementById('filter-end').value = s.filter.end_date || '';
  }
  renderRanges(s.time_ranges, s.active_days);
}

function fillTemplateSelects(options) {
  for (const id of ['dash-template', 'filter-template', 'rec-template']) {
    const sel = document.getElementById(id);
    const current = sel.value;
    const placeholder = id === 'filter-template' ? 'All templates' : options[0].label;
    sel.innerHTML = options.map((o, i) =>
      `<option value="${esc(o.value)}">${esc(i === 0 ? placeholder : o.label)}</option>`).join('');
    sel.value = current;
  }
}

async function boot() {
  try {
    applySession(await api('GET', '/api/session'));
    if (session && session.logged_in) await navigate(session.page || 'dashboard');
  } catch (e) {
    toast(e.message, true);
  }
}

document.getElementById('login-form').addEventListener('submit', async (ev) => {
  ev.preventDefault();
  try {
    const s = await api('POST', '/api/login', {
      username: document.getElementById('login-user').value,
      password: document.getElementById('login-pass').value,
    });
    document.getElementById('login-pass').value = '';
    applySession(s);
    await navigate('dashboard');
  } catch (e) {
    toast(e.message, true);
  }
});

document.getElementById('logout-btn').addEventListener('click', async () => {
  try {
    applySession(await api('POST', '/api/logout'));
  } catch (e) {
    toast(e.message, true);
  }
});

// -- navigation ------------------------------------------------------------

async function navigate(page) {
  // A newer navigation, or a newer load of the same view, wins.
  const nav = ++generations.page;
  const gen = ++generations[page];
  document.querySelectorAll('#nav button').forEach(b => b.classList.toggle('active', b.dataset.page === page));
  document.querySelectorAll('.panel').forEach(p => p.classList.toggle('active', p.id === 'panel-' + page));
  const data = await api('POST', '/api/navigate', { page });
  if (nav !== generations.page || gen !== generations[page]) return;
  if (data.page === 'dashboard' && data.view) renderDashboard(data.view);
  if (data.page === 'measurements') renderMeasurements(data.rows);
  if (data.page === 'templates') renderTemplates(data.templates);
}

document.getElementById('nav').addEventListener('click', (ev) => {
  const page = ev.target.dataset && ev.target.dataset.page;
  if (page) navigate(page).catch(e => toast(e.message, true));
});

// -- dashboard -------------------------------------------------------------

function renderRanges(presets, active) {
  const box = document.getElementById('dash-ranges');
  box.innerHTML = presets.map(d =>
    `<button data-days="${d}" class="${d === active ? 'active' : ''}">${d}d</button>`).join('');
}

document.getElementById('dash-ranges').addEventListener('click', (ev) => {
  const days = ev.target.dataset && ev.target.dataset.days;
  if (!days) return;
  dashDays = Number(days);
  loadDashboard();
});

document.getElementById('dash-template').addEventListener('change', (ev) => {
  dashTemplate = ev.target.value;
  loadDashboard();
});

async function loadDashboard() {
  const gen = ++generations.dashboard;
  const params = new URLSearchParams({ template_id: dashTemplate });
  if (dashDays) params.set('days', dashDays);
  try {
    const data = await api('GET', '/api/dashboard?' + params);
    if (gen !== generations.dashboard) return;
    renderRanges(data.time_ranges, data.active_days);
    renderDashboard(data.view);
  } catch (e) {
    toast(e.message, true);
  }
}

function renderDashboard(view) {
  const cards = document.getElementById('dash-cards');
  const charts = document.getElementById('dash-charts');
  const empty = document.getElementById('dash-empty');
  if (view.state === 'unknown_template') return;
  if (view.state === 'empty') {
    cards.innerHTML = '';
    charts.innerHTML = '';
    empty.classList.remove('hidden');
    return;
  }
  empty.classList.add('hidden');
  cards.innerHTML = view.cards.map(c => `
    <div class="stat-card">
      <div class="title">${esc(c.title)}</div>
      <div class="value">${esc(c.average)}<span class="unit">${esc(c.unit)}</span></div>
      <div class="range">${esc(c.range)} · ${c.count} readings</div>
    </div>`).join('');
  charts.innerHTML = view.charts.map(s => `
    <div class="card chart"><h3>${esc(s.title)}</h3>${lineChart(s.points)}</div>`).join('');
}

function lineChart(points) {
  if (!points.length) return '<div class="empty">No data in this range.</div>';
  const W = 800, H = 220, P = 32;
  const values = points.map(p => p.value);
  let min = Math.min(...values), max = Math.max(...values);
  if (min === max) { min -= 1; max += 1; }
  const x = i => points.length === 1 ? W / 2 : P + i * (W - 2 * P) / (points.length - 1);
  const y = v => H - P - (v - min) * (H - 2 * P) / (max - min);
  const path = points.map((p, i) => `${i ? 'L' : 'M'}${x(i).toFixed(1)},${y(p.value).toFixed(1)}`).join(' ');
  const dots = points.map((p, i) =>
    `<circle class="dot" cx="${x(i).toFixed(1)}" cy="${y(p.value).toFixed(1)}" r="3"><title>${esc(p.label)}: ${p.value}</title></circle>`).join('');
  const first = points[0].label, last = points[points.length - 1].label;
  return `<svg viewBox="0 0 ${W} ${H}" preserveAspectRatio="none">
    <line class="axis" x1="${P}" y1="${H - P}" x2="${W - P}" y2="${H - P}"/>
    <text x="${P}" y="${H - 10}">${esc(first)}</text>
    <text x="${W - P}" y="${H - 10}" text-anchor="end">${esc(last)}</text>
    <text x="4" y="${P}">${max}</text>
    <text x="4" y="${H - P}">${min}</text>
    <path class="line" d="${path}"/>${dots}</svg>`;
}

// -- measurements ----------------------------------------------------------

async function loadMeasurements() {
  const gen = ++generations.measurements;
  const params = new URLSearchParams({
    template_id: document.getElementById('filter-template').value,
    start_date: document.getElementById('filter-start').value,
    end_date: document.getElementById('filter-end').value,
  });
  try {
    const data = await api('GET', '/api/measurements?' + params);
    if (gen !== generations.measurements) return;
    renderMeasurements(data.rows);
  } catch (e) {
    toast(e.message, true);
  }
}

for (const id of ['filter-template', 'filter-start', 'filter-end']) {
  document.getElementById(id).addEventListener('change', loadMeasurements);
}

function renderMeasurements(rows) {
  const tbody = document.getElementById('measurements-tbody');
  document.getElementById('measurements-empty').classList.toggle('hidden', rows.length > 0);
  tbody.innerHTML = rows.map(r => `
    <tr>
      <td class="mono">${esc(localTime(r.measured_at))}</td>
      <td>${esc(r.template_name)}</td>
      <td>${r.values.map(v => esc(v.unit ? `${v.label}: ${v.value} ${v.unit}` : `${v.label}: ${v.value}`)).join('<br>')}
        ${r.notes ? `<div class="note">${esc(r.notes)}</div>` : ''}</td>
    </tr>`).join('');
}

document.getElementById('new-measurement-btn').addEventListener('click', () => openRecorder(''));
document.getElementById('rec-cancel').addEventListener('click', () => {
  document.getElementById('recorder').classList.add('hidden');
});
document.getElementById('rec-template').addEventListener('change', (ev) => openRecorder(ev.target.value));

async function openRecorder(templateId) {
  try {
    const form = await api('GET', '/api/recorder?' + new URLSearchParams({ template_id: templateId }));
    document.getElementById('recorder').classList.remove('hidden');
    document.getElementById('rec-template').value = form.template_id || '';
    document.getElementById('rec-at').value = form.measured_at;
    document.getElementById('rec-fields').innerHTML = form.fields.map(f => `
      <div class="field">
        <label>${esc(f.label)}</label>
        <input type="number" step="any" data-name="${esc(f.definition_name)}"
          ${f.min != null ? `min="${f.min}"` : ''} ${f.max != null ? `max="${f.max}"` : ''}
          ${f.required ? 'required' : ''}>
      </div>`).join('');
  } catch (e) {
    toast(e.message, true);
  }
}

document.getElementById('recorder-form').addEventListener('submit', async (ev) => {
  ev.preventDefault();
  const values = {};
  document.querySelectorAll('#rec-fields input').forEach(i => { values[i.dataset.name] = i.value; });
  try {
    await api('POST', '/api/measurements', {
      template_id: document.getElementById('rec-template').value,
      values,
      measured_at: document.getElementById('rec-at').value,
      notes: document.getElementById('rec-notes').value,
    });
    document.getElementById('recorder').classList.add('hidden');
    document.getElementById('rec-notes').value = '';
    toast('Measurement saved');
    await loadMeasurements();
  } catch (e) {
    toast(e.message, true);
  }
});

// -- templates -------------------------------------------------------------

function renderTemplates(templates) {
  document.getElementById('templates-empty').classList.toggle('hidden', templates.length > 0);
  document.getElementById('templates-tbody').innerHTML = templates.map(t => `
    <tr>
      <td>${esc(t.name)}</td>
      <td>${esc(t.description || '')}</td>
      <td>${t.value_definitions.map(v => esc(`${v.display_name} (${v.unit.display_name})`)).join(', ')}</td>
    </tr>`).join('');
}

function rowHtml() {
  return `<div class="def-row">${ROW_FIELDS.map(([key, label, req]) =>
    `<input data-key="${key}" placeholder="${label}" ${req ? 'required' : ''} ${key.endsWith('_value') ? 'type="number" step="any"' : ''}>`).join('')}
    <button class="btn danger" type="button" data-remove>×</button></div>`;
}

function syncRemoveButtons() {
  const rows = document.querySelectorAll('#ed-rows .def-row');
  rows.forEach(r => { r.querySelector('[data-remove]').disabled = rows.length <= 1; });
}

function openEditor() {
  document.getElementById('editor').classList.remove('hidden');
  document.getElementById('ed-name').value = '';
  document.getElementById('ed-desc').value = '';
  document.getElementById('ed-rows').innerHTML = rowHtml();
  syncRemoveButtons();
}

document.getElementById('new-template-btn').addEventListener('click', openEditor);
document.getElementById('ed-cancel').addEventListener('click', () => {
  document.getElementById('editor').classList.add('hidden');
});
document.getElementById('ed-add').addEventListener('click', () => {
  document.getElementById('ed-rows').insertAdjacentHTML('beforeend', rowHtml());
  syncRemoveButtons();
});
document.getElementById('ed-rows').addEventListener('click', (ev) => {
  if (!ev.target.hasAttribute('data-remove')) return;
  const rows = document.querySelectorAll('#ed-rows .def-row');
  if (rows.length <= 1) return;
  ev.target.closest('.def-row').remove();
  syncRemoveButtons();
});

document.getElementById('editor-form').addEventListener('submit', async (ev) => {
  ev.preventDefault();
  const rows = [...document.querySelectorAll('#ed-rows .def-row')].map(r => {
    const row = {};
    r.querySelectorAll('input').forEach(i => { row[i.dataset.key] = i.value; });
    return row;
  });
  try {
    await api('POST', '/api/templates', {
      name: document.getElementById('ed-name').value,
      description: document.getElementById('ed-desc').value,
      rows,
    });
    document.getElementById('editor').classList.add('hidden');
    toast('Template created');
    applySession(await api('GET', '/api/session'));
    await navigate('templates');
  } catch (e) {
    toast(e.message, true);
  }
});

boot();
</script>
</body>
</html>
"##;
