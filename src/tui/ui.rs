//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::ternary::{to_trits, Trit};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &mut DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, registers, watches, status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_watches(frame, left_chunks[2], app);
    draw_status(frame, left_chunks[3], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Draw disassembly view.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));
    let breakpoints = &app.vm.debug().breakpoints;

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if breakpoints.contains(*addr) { "●" } else { " " };
            let text = format!("{}{:03}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if breakpoints.contains(*addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw register state with trit coloring.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let vm = &app.vm;
    let regs = vm.registers();

    let mut acc_line = vec![Span::raw("ACC: ")];
    acc_line.extend(trit_spans(regs.acc));
    acc_line.push(Span::raw(format!(" = {}", regs.acc)));

    let stack = vm
        .call_stack()
        .iter()
        .map(|a| format!("{:03}", a))
        .collect::<Vec<_>>()
        .join(" ");

    let content = vec![
        Line::from(acc_line),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:03}", regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw("   IR: "),
            Span::styled(format!("{}", regs.ir), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Stack: "),
            Span::styled(if stack.is_empty() { "-".to_string() } else { stack }, Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("Steps: "),
            Span::styled(format!("{}", vm.instruction_count()), Style::default().fg(Color::Cyan)),
            Span::raw("   History: "),
            Span::styled(format!("{}", vm.history_len()), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", vm.state()),
                if vm.is_halted() {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Green)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw watch values.
fn draw_watches(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .vm
        .watch_values()
        .into_iter()
        .map(|w| {
            let style = if w.value.is_some() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(w.to_string()).style(style)
        })
        .chain(app.vm.debug().breakpoints.conditions().iter().map(|c| {
            ListItem::new(format!("when {}", c)).style(Style::default().fg(Color::Red))
        }))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Watches ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(list, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &mut DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    app.scroll_to_selection(visible_rows);

    let mem = app.vm.memory();
    let start = app.mem_scroll;
    let end = (start + visible_rows).min(mem.len());
    let hottest = mem.access_counts().iter().copied().max().unwrap_or(0).max(1);

    let items: Vec<ListItem> = (start..end)
        .map(|addr| {
            let value = mem.cells()[addr];
            let is_pc = addr == app.vm.pc();
            let lock = if mem.is_protected(addr) { "🔒" } else { "  " };
            let cursor = if addr == app.selected_addr { ">" } else { " " };

            let text = if app.show_heatmap {
                format!("{}{:03}:{} hits {}", cursor, addr, lock, mem.access_counts()[addr])
            } else {
                format!("{}{:03}:{} {:>6}", cursor, addr, lock, value)
            };

            let style = if is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.show_heatmap {
                heat_style(mem.access_counts()[addr], hottest)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let title = if app.show_heatmap { " Memory (heat map) " } else { " Memory " };
    let list = List::new(items)
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  u: Step back  r: Run  p: Pause"),
        Line::from("b: Breakpoint  w: Protect  h: Heat map"),
        Line::from("x: Reset  ↑↓: Select cell  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Balanced ternary digits of a value, colored by sign.
fn trit_spans(value: i64) -> Vec<Span<'static>> {
    to_trits(value)
        .into_iter()
        .map(|t| Span::styled(t.to_char().to_string(), trit_style(t)))
        .collect()
}

/// Get color style for a trit.
fn trit_style(t: Trit) -> Style {
    match t {
        Trit::N => Style::default().fg(Color::Red),
        Trit::O => Style::default().fg(Color::Gray),
        Trit::P => Style::default().fg(Color::Green),
    }
}

fn heat_style(count: u64, hottest: u64) -> Style {
    match count * 3 / hottest {
        0 if count == 0 => Style::default().fg(Color::DarkGray),
        0 => Style::default().fg(Color::Blue),
        1 => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::Red),
    }
}
