//! Plain HTML console pages

use std::io::Write;

use contracts::{
    ContractError, CounterSnapshot, HeapHistogram, HtmlReportRenderer, HtmlView, Locale, Period,
    ProcessInformations, ReportContext, RuntimeInformations, SessionInformations,
    ThreadInformations,
};

use crate::locale::{translate, Message};

/// Stylesheet requested through the `resource` parameter
pub const STYLESHEET: &str = "monitoring.css";

const GRAPH_WIDTH: u32 = 200;
const GRAPH_HEIGHT: u32 = 50;
const DETAIL_GRAPH_WIDTH: u32 = 960;
const DETAIL_GRAPH_HEIGHT: u32 = 400;

/// HTML renderer without templates or scripts
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHtmlReport;

impl HtmlReportRenderer for PlainHtmlReport {
    fn render(
        &self,
        context: &ReportContext<'_>,
        view: HtmlView<'_>,
        out: &mut dyn Write,
    ) -> Result<(), ContractError> {
        let t = |message| translate(context.locale, message);
        header(out, context)?;
        match view {
            HtmlView::Dashboard { message } => {
                banner(out, message)?;
                dashboard(out, context)?;
            }
            HtmlView::GraphDetail { graph } => graph_detail(out, context, graph)?,
            HtmlView::Sessions { sessions, message } => {
                banner(out, message)?;
                writeln!(out, "<h2>{}</h2>", t(Message::Sessions))?;
                sessions_table(out, sessions)?;
            }
            HtmlView::SessionDetail {
                session_id,
                session,
            } => match session {
                Some(session) => {
                    writeln!(out, "<h2>{} {}</h2>", t(Message::Sessions), escape(session_id))?;
                    sessions_table(out, std::slice::from_ref(session))?;
                }
                None => writeln!(
                    out,
                    "<p class=\"message\">{} : {}</p>",
                    t(Message::NoSession),
                    escape(session_id)
                )?,
            },
            HtmlView::CurrentRequests { threads } => {
                writeln!(out, "<h2>{}</h2>", t(Message::CurrentRequests))?;
                threads_table(out, threads)?;
            }
            HtmlView::HeapHistogram { histogram, message } => {
                banner(out, message)?;
                writeln!(out, "<h2>{}</h2>", t(Message::HeapHistogram))?;
                heap_table(out, histogram)?;
            }
            HtmlView::Processes { processes } => {
                writeln!(out, "<h2>{}</h2>", t(Message::Processes))?;
                processes_table(out, processes)?;
            }
            HtmlView::Message { text } => banner(out, Some(text))?,
        }
        writeln!(out, "</body></html>")?;
        Ok(())
    }
}

fn header(out: &mut dyn Write, context: &ReportContext<'_>) -> Result<(), ContractError> {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"{}\"><head>", escape(context.locale.tag()))?;
    writeln!(out, "<meta charset=\"UTF-8\">")?;
    writeln!(
        out,
        "<title>{} - {}</title>",
        translate(context.locale, Message::Title),
        escape(context.application())
    )?;
    writeln!(
        out,
        "<link rel=\"stylesheet\" href=\"?resource={STYLESHEET}\">"
    )?;
    writeln!(out, "</head><body>")?;
    writeln!(
        out,
        "<h1>{} - {}{}</h1>",
        translate(context.locale, Message::Title),
        escape(context.application()),
        if context.collector_server { " (collector)" } else { "" }
    )?;
    Ok(())
}

fn banner(out: &mut dyn Write, message: Option<&str>) -> Result<(), ContractError> {
    if let Some(message) = message {
        writeln!(out, "<p class=\"message\">{}</p>", escape(message))?;
    }
    Ok(())
}

fn dashboard(out: &mut dyn Write, context: &ReportContext<'_>) -> Result<(), ContractError> {
    let period = context.period;
    let locale = context.locale;

    write!(out, "<p class=\"periods\">")?;
    for fixed in Period::FIXED {
        let class = if fixed == *period { " class=\"selected\"" } else { "" };
        write!(out, "<a{class} href=\"?period={}\">{}</a> ", fixed.token(), fixed.token())?;
    }
    writeln!(out, "</p>")?;

    writeln!(out, "<h2>{} ({})</h2>", translate(locale, Message::Statistics), escape(&period.token()))?;
    for counter in context.collector.counters() {
        counter_table(out, &counter.snapshot(), locale)?;
    }

    writeln!(out, "<h2>{}</h2>", translate(locale, Message::Graphs))?;
    writeln!(out, "<div class=\"graphs\">")?;
    for counter in context.collector.counters() {
        for suffix in ["hits", "mean", "errors"] {
            let graph = format!("{}_{suffix}", counter.name());
            writeln!(
                out,
                "<a href=\"?part=graph&amp;graph={g}&amp;period={p}\"><img src=\"?graph={g}&amp;width={GRAPH_WIDTH}&amp;height={GRAPH_HEIGHT}&amp;period={p}\" alt=\"{g}\"></a>",
                g = escape(&graph),
                p = escape(&period.token()),
            )?;
        }
    }
    writeln!(out, "</div>")?;

    runtime_table(out, context.runtime)?;

    write!(out, "<p class=\"links\">")?;
    write!(out, "<a href=\"?part=currentRequests\">{}</a> ", translate(locale, Message::CurrentRequests))?;
    write!(out, "<a href=\"?part=sessions\">{}</a> ", translate(locale, Message::Sessions))?;
    write!(out, "<a href=\"?part=heaphisto\">{}</a> ", translate(locale, Message::HeapHistogram))?;
    write!(out, "<a href=\"?part=processes\">{}</a> ", translate(locale, Message::Processes))?;
    if context.descriptors.deployment {
        write!(out, "<a href=\"?part=web.xml\">web.xml</a> ")?;
    }
    if context.descriptors.build {
        write!(out, "<a href=\"?part=pom.xml\">pom.xml</a> ")?;
    }
    write!(out, "<a href=\"?format=pdf&amp;period={}\">PDF</a>", escape(&period.token()))?;
    writeln!(out, "</p>")?;
    Ok(())
}

fn counter_table(
    out: &mut dyn Write,
    snapshot: &CounterSnapshot,
    locale: &Locale,
) -> Result<(), ContractError> {
    writeln!(
        out,
        "<h3>{} : {} {}, {} {}</h3>",
        escape(&snapshot.name),
        snapshot.hits(),
        translate(locale, Message::Hits),
        snapshot.system_errors(),
        translate(locale, Message::Errors)
    )?;
    writeln!(out, "<table class=\"counter\">")?;
    writeln!(
        out,
        "<tr><th>Request</th><th>{}</th><th>{}</th><th>{}</th><th>{}</th></tr>",
        translate(locale, Message::Hits),
        translate(locale, Message::MeanDuration),
        translate(locale, Message::MaxDuration),
        translate(locale, Message::Errors)
    )?;
    let mut requests: Vec<_> = snapshot.requests.iter().collect();
    requests.sort_by(|a, b| b.duration_sum_ms.cmp(&a.duration_sum_ms).then_with(|| a.name.cmp(&b.name)));
    for request in requests {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&request.name),
            request.hits,
            request.mean_ms(),
            request.max_duration_ms,
            request.system_errors
        )?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn runtime_table(out: &mut dyn Write, runtime: &[RuntimeInformations]) -> Result<(), ContractError> {
    if runtime.is_empty() {
        return Ok(());
    }
    writeln!(out, "<table class=\"runtime\">")?;
    writeln!(out, "<tr><th>Host</th><th>PID</th><th>OS</th><th>CPUs</th><th>Memory (MB)</th><th>Threads</th><th>Sessions</th><th>Load</th></tr>")?;
    for info in runtime {
        let load = info
            .system_load_average
            .map_or_else(|| "-".to_string(), |l| format!("{l:.2}"));
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} / {}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&info.host),
            info.pid,
            escape(&info.os),
            info.available_processors,
            info.used_memory_bytes / (1024 * 1024),
            info.max_memory_bytes / (1024 * 1024),
            info.thread_count,
            info.session_count,
            load
        )?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn graph_detail(
    out: &mut dyn Write,
    context: &ReportContext<'_>,
    graph: Option<&str>,
) -> Result<(), ContractError> {
    let Some(graph) = graph else {
        return banner(out, Some(translate(context.locale, Message::MissingParameter)));
    };
    let period = context.period.token();
    writeln!(out, "<h2>{}</h2>", escape(graph))?;
    writeln!(
        out,
        "<img src=\"?graph={g}&amp;width={DETAIL_GRAPH_WIDTH}&amp;height={DETAIL_GRAPH_HEIGHT}&amp;period={p}\" alt=\"{g}\">",
        g = escape(graph),
        p = escape(&period),
    )?;

    // graph names are `<counter>_<measure>`
    let counter_name = graph.rsplit_once('_').map_or(graph, |(counter, _)| counter);
    if let Some(counter) = context
        .collector
        .counters()
        .into_iter()
        .find(|c| c.name() == counter_name)
    {
        counter_table(out, &counter.snapshot(), context.locale)?;
    }
    Ok(())
}

fn sessions_table(out: &mut dyn Write, sessions: &[SessionInformations]) -> Result<(), ContractError> {
    writeln!(out, "<table class=\"sessions\">")?;
    writeln!(out, "<tr><th>Id</th><th>Created</th><th>Last access</th><th>Attributes</th><th>Size</th><th>Address</th><th>User</th></tr>")?;
    for session in sessions {
        writeln!(
            out,
            "<tr><td><a href=\"?part=sessions&amp;sessionId={id}\">{id}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            session.created_at.format("%Y-%m-%d %H:%M:%S"),
            session.last_access.format("%Y-%m-%d %H:%M:%S"),
            session.attribute_count,
            session
                .serialized_size
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            escape(session.remote_addr.as_deref().unwrap_or("-")),
            escape(session.user.as_deref().unwrap_or("-")),
            id = escape(&session.id),
        )?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn threads_table(out: &mut dyn Write, threads: &[ThreadInformations]) -> Result<(), ContractError> {
    writeln!(out, "<table class=\"threads\">")?;
    writeln!(out, "<tr><th>Id</th><th>Name</th><th>State</th><th>Request</th></tr>")?;
    for thread in threads {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            thread.id,
            escape(&thread.name),
            escape(&thread.state),
            escape(thread.current_request.as_deref().unwrap_or("-"))
        )?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn heap_table(out: &mut dyn Write, histogram: &HeapHistogram) -> Result<(), ContractError> {
    if let Some(taken_at) = histogram.taken_at {
        writeln!(out, "<p>{}</p>", taken_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }
    writeln!(out, "<table class=\"heap\">")?;
    writeln!(out, "<tr><th>Class</th><th>Instances</th><th>Bytes</th></tr>")?;
    for class in &histogram.classes {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&class.name),
            class.instances,
            class.bytes
        )?;
    }
    writeln!(
        out,
        "<tr class=\"total\"><td>Total</td><td>{}</td><td>{}</td></tr>",
        histogram.total_instances(),
        histogram.total_bytes()
    )?;
    writeln!(out, "</table>")?;
    Ok(())
}

fn processes_table(
    out: &mut dyn Write,
    processes: &[ProcessInformations],
) -> Result<(), ContractError> {
    writeln!(out, "<table class=\"processes\">")?;
    writeln!(out, "<tr><th>User</th><th>PID</th><th>%CPU</th><th>%MEM</th><th>VSZ</th><th>RSS</th><th>State</th><th>Command</th></tr>")?;
    for process in processes {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&process.user),
            process.pid,
            process.cpu_percent,
            process.memory_percent,
            process.virtual_size_kb,
            process.resident_size_kb,
            escape(&process.state),
            escape(&process.command)
        )?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

/// Escape text for element content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
