// =============================================================================
// Page Registry — named containers, load tickets and page markup
// =============================================================================
//
// Every chart writes into exactly one registered container. Loads are
// ordered with per-container generation tickets:
//
//   begin_load(id)   → ticket N  (N strictly increasing per container)
//   commit(ticket)   → stored only if no ticket > N has committed yet
//
// so a slow response can never overwrite a newer one.
// =============================================================================

use std::collections::BTreeMap;
use std::fmt::Write;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::chart::candlestick::KLINE_MARGIN;
use crate::chart::svg::escape;
use crate::error::DashboardError;
use crate::runtime_config::DashboardConfig;
use crate::types::{ContainerId, Resolution};

/// What a container currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum ContainerContent {
    /// Nothing loaded yet.
    Empty,
    Svg(String),
    Html(String),
    /// Informational text ("no data").
    Message(String),
    /// Localized failure text.
    Error(String),
}

impl ContainerContent {
    /// Markup placed inside the container element.
    pub fn to_html(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Svg(s) | Self::Html(s) => s.clone(),
            Self::Message(m) => format!(r#"<p class="text-muted text-center">{}</p>"#, escape(m)),
            Self::Error(m) => format!(r#"<p class="text-danger text-center">{}</p>"#, escape(m)),
        }
    }
}

/// Permission to commit one load result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub container: ContainerId,
    pub generation: u64,
}

#[derive(Debug)]
struct Slot {
    content: ContainerContent,
    issued: u64,
    committed: u64,
}

pub struct PageRegistry {
    slots: RwLock<BTreeMap<ContainerId, Slot>>,
}

impl PageRegistry {
    pub fn new(containers: &[ContainerId]) -> Self {
        let slots = containers
            .iter()
            .map(|id| {
                (
                    *id,
                    Slot {
                        content: ContainerContent::Empty,
                        issued: 0,
                        committed: 0,
                    },
                )
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.slots.read().contains_key(&id)
    }

    pub fn ids(&self) -> Vec<ContainerId> {
        self.slots.read().keys().copied().collect()
    }

    /// Reserve the next generation for `id`.
    pub fn begin_load(&self, id: ContainerId) -> Result<LoadTicket, DashboardError> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(&id)
            .ok_or_else(|| DashboardError::MissingContainer(id.to_string()))?;
        slot.issued += 1;
        Ok(LoadTicket {
            container: id,
            generation: slot.issued,
        })
    }

    /// Store `content` unless a newer ticket already committed.
    /// Returns whether the content was stored.
    pub fn commit(&self, ticket: LoadTicket, content: ContainerContent) -> Result<bool, DashboardError> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(&ticket.container)
            .ok_or_else(|| DashboardError::MissingContainer(ticket.container.to_string()))?;
        if ticket.generation <= slot.committed {
            debug!(
                container = %ticket.container,
                generation = ticket.generation,
                committed = slot.committed,
                "dropping stale load result"
            );
            return Ok(false);
        }
        slot.committed = ticket.generation;
        slot.content = content;
        Ok(true)
    }

    /// Overwrite the content without touching the generations, so a load
    /// already in flight still commits.
    pub fn replace(&self, id: ContainerId, content: ContainerContent) -> Result<(), DashboardError> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(&id)
            .ok_or_else(|| DashboardError::MissingContainer(id.to_string()))?;
        slot.content = content;
        Ok(())
    }

    pub fn get(&self, id: ContainerId) -> Result<ContainerContent, DashboardError> {
        self.slots
            .read()
            .get(&id)
            .map(|s| s.content.clone())
            .ok_or_else(|| DashboardError::MissingContainer(id.to_string()))
    }

    pub fn snapshot(&self) -> BTreeMap<ContainerId, ContainerContent> {
        self.slots
            .read()
            .iter()
            .map(|(id, s)| (*id, s.content.clone()))
            .collect()
    }
}

// =============================================================================
// Page markup
// =============================================================================

const PAGE_SCRIPT: &str = r#"
(function () {
  const proto = location.protocol === 'https:' ? 'wss' : 'ws';
  const ws = new WebSocket(proto + '://' + location.host + '/api/v1/ws');
  ws.onmessage = (ev) => {
    const msg = JSON.parse(ev.data);
    for (const [id, html] of Object.entries(msg.containers || {})) {
      const el = document.getElementById(id);
      if (el) el.innerHTML = html;
    }
  };

  const kline = document.getElementById('kline-chart-container');
  if (!kline) return;
  const plotLeft = Number(kline.dataset.plotLeft || 0);
  const tooltip = document.createElement('div');
  tooltip.className = 'kline-tooltip';
  tooltip.style.cssText = 'position:fixed;display:none;pointer-events:none;background:#fff;border:1px solid #999;padding:2px 6px;font:12px sans-serif';
  document.body.appendChild(tooltip);

  const post = (url, body) =>
    fetch(url, { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body) })
      .then((r) => (r.ok ? r.text() : null))
      .then((svg) => { if (svg) kline.innerHTML = svg; });

  let t = { k: 1, x: 0 };
  let drag = null;
  const plotX = (ev) => ev.clientX - kline.getBoundingClientRect().left - plotLeft;

  kline.addEventListener('wheel', (ev) => {
    ev.preventDefault();
    const px = plotX(ev);
    const k = Math.min(40, Math.max(1, t.k * (ev.deltaY < 0 ? 1.1 : 1 / 1.1)));
    t = { k: k, x: px - (px - t.x) * (k / t.k) };
    post('/api/v1/kline/zoom', t);
  }, { passive: false });

  kline.addEventListener('mousedown', (ev) => { drag = { start: ev.clientX, x: t.x }; });
  window.addEventListener('mouseup', () => {
    if (drag) post('/api/v1/kline/zoom', t);
    drag = null;
  });

  let pending = false;
  kline.addEventListener('mousemove', (ev) => {
    if (drag) {
      t = { k: t.k, x: drag.x + ev.clientX - drag.start };
      return;
    }
    if (pending) return;
    pending = true;
    fetch('/api/v1/kline/hover?x=' + plotX(ev))
      .then((r) => r.json())
      .then((info) => {
        if (info) {
          tooltip.textContent = info.text;
          tooltip.style.left = ev.clientX + 12 + 'px';
          tooltip.style.top = ev.clientY + 12 + 'px';
          tooltip.style.display = 'block';
        } else {
          tooltip.style.display = 'none';
        }
      })
      .finally(() => { pending = false; });
  });
  kline.addEventListener('mouseleave', () => { tooltip.style.display = 'none'; });

  let resizeTimer = null;
  window.addEventListener('resize', () => {
    clearTimeout(resizeTimer);
    resizeTimer = setTimeout(() => {
      const r = kline.getBoundingClientRect();
      if (r.width > 0 && r.height > 0) post('/api/v1/kline/resize', { width: r.width, height: r.height });
    }, 200);
  });
})();
"#;

/// Full dashboard page: config element, resolution buttons, containers.
pub fn render_page(
    config: &DashboardConfig,
    resolution: Resolution,
    page: &PageRegistry,
) -> String {
    let mut out = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    let _ = write!(out, "<title>{} dashboard</title></head><body>", escape(&config.coin));

    out.push_str(r#"<div id="data-config""#);
    for (key, value) in config.dataset() {
        let _ = write!(out, r#" data-{key}="{}""#, escape(&value));
    }
    out.push_str("></div>");

    out.push_str(r#"<nav class="resolution-buttons">"#);
    for r in Resolution::ALL {
        let active = if r == resolution { " active" } else { "" };
        let _ = write!(
            out,
            r#"<form method="post" action="/api/v1/resolution/{r}"><button type="submit" class="resolution-btn{active}" data-resolution="{r}">{r}</button></form>"#,
        );
    }
    out.push_str("</nav>");

    for (id, content) in page.snapshot() {
        let plot_left = match id {
            ContainerId::KlineChartContainer => format!(r#" data-plot-left="{}""#, KLINE_MARGIN.left),
            _ => String::new(),
        };
        let _ = write!(
            out,
            r#"<div id="{id}" class="dashboard-container"{plot_left}>{}</div>"#,
            content.to_html()
        );
    }

    let _ = write!(out, "<script>{PAGE_SCRIPT}</script></body></html>");
    out
}
