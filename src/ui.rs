// ============================================
// src/ui.rs
// Screen rendering, one function per session phase
// ============================================

use rand::Rng;
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::app::{App, InputMode, RECENT_SHORTCUTS};
use crate::content::Block as ExplBlock;
use crate::language::Language;
use crate::session::{AdvanceMode, Phase, QuestionView, ResponseMode};

const TITLE: &str = "UVA Learning · Super Quiz";

pub fn render<R: Rng>(f: &mut Frame, app: &App<'_, R>) {
    let size = f.area();
    let block = Block::default().borders(Borders::ALL).title(TITLE);
    let inner_area = block.inner(size);
    f.render_widget(block, size);

    match app.session.phase() {
        Phase::SelectingLanguage => language_screen(f, inner_area),
        Phase::SelectingQuiz => catalog_screen(f, app, inner_area),
        Phase::InProgress => quiz_screen(f, app, inner_area),
        Phase::Finished => result_screen(f, app, inner_area),
    }
}

// --------------------------------------------------
// Language selection
// --------------------------------------------------

fn language_screen(f: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from("Choose a language · Elige un idioma").bold(),
        Line::from(""),
    ];
    for (i, lang) in Language::ALL.iter().enumerate() {
        lines.push(Line::from(format!("{}. {} ({})", i + 1, lang.native_name(), lang.tag())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Esc: quit / salir").style(Style::default().fg(Color::DarkGray)));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Min(1)])
        .split(area);
    f.render_widget(Paragraph::new(lines).centered(), chunks[1]);
}

// --------------------------------------------------
// Catalog
// --------------------------------------------------

fn catalog_screen<R: Rng>(f: &mut Frame, app: &App<'_, R>, area: Rect) {
    let lang = app.session.language().unwrap_or(Language::EsMx);
    let query = &app.browser.query;
    let page = app.catalog_page();
    let recents = app.recent_metas();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // [0] filter summary
            Constraint::Length(1), // [1] search box
            Constraint::Length(if recents.is_empty() { 0 } else { 2 }), // [2] recents
            Constraint::Min(1),    // [3] quiz list
            Constraint::Length(1), // [4] page + message
            Constraint::Length(1), // [5] key help
        ])
        .split(area);

    // 0. filters
    let mut summary = vec![
        format!("{}: {}", lang.pick("Subject", "Materia"), empty_dash(&query.subject)),
        format!(
            "{}: {}",
            lang.pick("Unit", "Unidad"),
            query
                .unit
                .map(|u| u.to_string())
                .unwrap_or_else(|| lang.pick("All", "Todas").to_string())
        ),
    ];
    if !query.tags.is_empty() {
        summary.push(format!("Tags: {}", query.tags.join(", ")));
    }
    let active = query.active_filter_count();
    if active > 0 {
        summary.push(format!("{} ({active})", lang.pick("Filters", "Filtros")));
    }
    f.render_widget(
        Paragraph::new(summary.join(" · ")).style(Style::default().fg(Color::Cyan)),
        chunks[0],
    );

    // 1. search
    let searching = app.input_mode() == InputMode::Search;
    let search_style = if searching {
        Style::default().fg(Color::Black).bg(Color::White)
    } else {
        Style::default().fg(Color::Gray)
    };
    f.render_widget(
        Paragraph::new(format!(
            "/ {}{}",
            query.search,
            if searching { "_" } else { "" }
        ))
        .style(search_style),
        chunks[1],
    );

    // 2. recents
    if let Some(last) = recents.first() {
        let numbered: Vec<_> = recents
            .iter()
            .take(RECENT_SHORTCUTS)
            .enumerate()
            .map(|(i, m)| format!("{} {}", i + 1, m.title))
            .collect();
        let lines = vec![
            Line::from(format!("{} (c): {}", lang.pick("Continue", "Continuar"), last.card_title()))
                .style(Style::default().fg(Color::Green)),
            Line::from(format!("{}: {}", lang.pick("Recent", "Recientes"), numbered.join(" · ")))
                .style(Style::default().fg(Color::DarkGray)),
        ];
        f.render_widget(Paragraph::new(lines), chunks[2]);
    }

    // 3. list
    let lines: Vec<Line> = if page.items.is_empty() {
        vec![Line::from(lang.pick("No quizzes match these filters.", "No hay quizzes con esos filtros."))
            .style(Style::default().fg(Color::Yellow))]
    } else {
        page.items
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let style = if i == app.browser.cursor {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default()
                };
                let mut spans = vec![Span::styled(m.card_title(), style)];
                if !m.tags.is_empty() {
                    spans.push(Span::styled(
                        format!("  [{}]", m.tags.join(", ")),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                if let Some(folder) = &m.folder {
                    spans.push(Span::styled(format!("  {folder}/"), Style::default().fg(Color::DarkGray)));
                }
                Line::from(spans)
            })
            .collect()
    };
    f.render_widget(Paragraph::new(lines), chunks[3]);

    // 4. page / message
    let mut footer = vec![Span::raw(format!(
        "{} {}/{} · {} quizzes",
        lang.pick("Page", "Página"),
        page.number,
        page.total_pages,
        page.total_items
    ))];
    if let Some(msg) = app.message() {
        footer.push(Span::styled(format!("  {msg}"), Style::default().fg(Color::Red).bold()));
    }
    f.render_widget(Paragraph::new(Line::from(footer)), chunks[4]);

    // 5. help
    f.render_widget(
        Paragraph::new(lang.pick(
            "↑↓ move · Enter open · c/1-6 recent · Tab subject · u unit · f tag · / search · x clear · [ ] page · Del clear recents · Esc quit",
            "↑↓ mover · Enter abrir · c/1-6 recientes · Tab materia · u unidad · f tag · / buscar · x limpiar · [ ] página · Supr borrar recientes · Esc salir",
        ))
        .style(Style::default().fg(Color::DarkGray)),
        chunks[5],
    );
}

fn empty_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

// --------------------------------------------------
// Quiz
// --------------------------------------------------

fn quiz_screen<R: Rng>(f: &mut Frame, app: &App<'_, R>, area: Rect) {
    let s = &app.session;
    let Some(view) = s.current_view() else {
        return;
    };
    let lang = view.language;
    let flags = s.view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // [0] progress gauge
            Constraint::Length(1), // [1] score line
            Constraint::Min(6),    // [2] panels
            Constraint::Length(if flags.show_answer { 1 } else { 0 }), // [3] answer
            Constraint::Length(1), // [4] toggles
            Constraint::Length(1), // [5] key help / jump input
        ])
        .split(area);

    // 0. progress
    let label = format!(
        "{} {} / {}",
        lang.pick("Question", "Pregunta"),
        view.number,
        view.total
    );
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Black))
        .ratio(f64::from(s.progress_pct()) / 100.0)
        .label(label);
    f.render_widget(gauge, chunks[0]);

    // 1. score
    let mut score = vec![Span::styled(
        format!(
            "✔ {} · ✖ {} · {}: {}%",
            s.correct(),
            s.incorrect(),
            lang.pick("Grade", "Calificación"),
            s.grade()
        ),
        Style::default().fg(Color::Yellow),
    )];
    if let Some(meta) = s.meta() {
        score.push(Span::styled(
            format!("   {}", meta.card_title()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(score)), chunks[1]);

    // 2. panels side by side
    let mut panels = vec![Constraint::Min(20)];
    if flags.show_explanation {
        panels.push(Constraint::Min(20));
    }
    if flags.show_translation {
        panels.push(Constraint::Min(20));
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(panels)
        .split(chunks[2]);

    question_panel(f, app, &view, columns[0]);
    let mut next = 1;
    if flags.show_explanation {
        explanation_panel(f, &view.active.explanation, lang.pick("Explanation", "Explicación"), columns[next]);
        next += 1;
    }
    if flags.show_translation {
        translation_panel(f, &view, columns[next]);
    }

    // 3. answer
    if flags.show_answer {
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw(format!("{}: ", lang.pick("Answer", "Respuesta"))),
                Span::styled(view.active.correct_text.clone(), Style::default().fg(Color::Green).bold()),
            ])),
            chunks[3],
        );
    }

    // 4. toggles
    let on_off = |on: bool| if on { "ON" } else { "OFF" };
    let mode = match s.advance_mode() {
        AdvanceMode::RetryUntilCorrect => lang.pick("retry until correct", "repetir hasta acertar"),
        AdvanceMode::AdvanceAlways => lang.pick("advance always", "avanzar bien o mal"),
    };
    let response = match s.response_mode() {
        ResponseMode::Answer => lang.pick("answer", "responder"),
        ResponseMode::Listen => lang.pick("listen", "escuchar"),
    };
    f.render_widget(
        Paragraph::new(format!(
            "{} {} · {}: {} · {}: {} · {}",
            lang.pick("Reading", "Lectura"),
            on_off(s.read_aloud()),
            lang.pick("Mode", "Modo"),
            mode,
            lang.pick("Keys", "Teclas"),
            response,
            lang
        ))
        .style(Style::default().fg(Color::Cyan)),
        chunks[4],
    );

    // 5. help or jump prompt
    let help = if app.input_mode() == InputMode::Jump {
        Paragraph::new(format!(
            "{} (1-{}): {}_",
            lang.pick("Go to question", "Ir a la pregunta"),
            view.total,
            app.input()
        ))
        .style(Style::default().fg(Color::Black).bg(Color::White))
    } else {
        Paragraph::new(lang.pick(
            "1-4 answer · Enter repeat · * answer · - answer & next · 0 listen/answer · e explanation · t translation · x read explanation · r reading · m mode · l language · g go to · Esc quit",
            "1-4 responder · Enter repetir · * respuesta · - contestar · 0 escuchar/responder · e explicación · t traducción · x leer explicación · r lectura · m modo · l idioma · g ir a · Esc salir",
        ))
        .style(Style::default().fg(Color::DarkGray))
    };
    f.render_widget(help, chunks[5]);
}

fn question_panel<R: Rng>(f: &mut Frame, app: &App<'_, R>, view: &QuestionView<'_>, area: Rect) {
    let s = &app.session;
    let lang = view.language;
    let mut lines = Vec::new();

    if let Some(category) = view.category {
        lines.push(Line::from(category.to_string()).style(Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(view.active.text.clone()).bold());
    lines.push(Line::from(""));

    if s.just_correct() {
        lines.push(
            Line::from(lang.pick("✔ Correct!", "✔ ¡Correcto!")).style(Style::default().fg(Color::Green).bold()),
        );
    }

    for (i, option) in view.active.options.iter().enumerate() {
        let style = if s.just_correct() && i == view.active.correct_index {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else if s.selected_answer() == Some(option.as_str()) {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("{}. {option}", i + 1), style)));
    }

    let panel = Block::default().borders(Borders::ALL);
    f.render_widget(
        Paragraph::new(lines).block(panel).wrap(Wrap { trim: false }),
        area,
    );
}

fn translation_panel(f: &mut Frame, view: &QuestionView<'_>, area: Rect) {
    let lang = view.language;
    let other = view.translation;
    let mut lines = vec![
        Line::from(other.text.clone()).bold(),
        Line::from(""),
    ];
    for option in &other.options {
        lines.push(Line::from(format!("• {option}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(lang.pick("Explicación", "Explanation")).bold());
    lines.extend(block_lines(&other.explanation));

    let title = lang.pick("Question in Spanish", "Pregunta en Inglés");
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn explanation_panel(f: &mut Frame, blocks: &[ExplBlock], title: &str, area: Rect) {
    f.render_widget(
        Paragraph::new(block_lines(blocks))
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false }),
        area,
    );
}

/// Explanation blocks as terminal lines.
fn block_lines(blocks: &[ExplBlock]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            ExplBlock::Text { content } => lines.push(Line::from(content.clone())),
            ExplBlock::Heading { content } => {
                lines.push(Line::from(content.clone()).bold().fg(Color::Magenta))
            }
            ExplBlock::Link { content } => {
                lines.push(Line::from(content.clone()).underlined().fg(Color::Cyan))
            }
            ExplBlock::Code { content } => {
                for code_line in content.lines() {
                    lines.push(
                        Line::from(code_line.to_string()).style(Style::default().fg(Color::Gray).bg(Color::Black)),
                    );
                }
            }
            ExplBlock::Unordered { items } => {
                lines.extend(items.iter().map(|item| Line::from(format!("  • {item}"))));
            }
            ExplBlock::Ordered { items } => {
                lines.extend(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| Line::from(format!("  {}. {item}", i + 1))),
                );
            }
            ExplBlock::Image { src, alt } => lines.push(
                Line::from(format!("[image: {}]", alt.as_deref().unwrap_or(src)))
                    .style(Style::default().fg(Color::DarkGray)),
            ),
            ExplBlock::Divider => lines.push(Line::from("────────────").fg(Color::DarkGray)),
        }
    }
    lines
}

// --------------------------------------------------
// Result
// --------------------------------------------------

fn result_screen<R: Rng>(f: &mut Frame, app: &App<'_, R>, area: Rect) {
    let s = &app.session;
    let lang = s.language().unwrap_or(Language::EsMx);
    let lines = vec![
        Line::from(lang.pick("Final Result", "Resultado Final")).bold(),
        Line::from(""),
        Line::from(format!(
            "{} {}/{}",
            lang.pick("Your score", "Tu puntaje es"),
            s.score(),
            s.attempts()
        )),
        Line::from(format!(
            "✔ {} · ✖ {} · {} {}%",
            s.correct(),
            s.incorrect(),
            lang.pick("Grade:", "Calificación:"),
            s.grade()
        ))
        .style(Style::default().fg(Color::Yellow)),
        Line::from(""),
        Line::from(lang.pick(
            "r restart · l language · Esc quit",
            "r reiniciar · l idioma · Esc salir",
        ))
        .style(Style::default().fg(Color::DarkGray)),
    ];

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(30), Constraint::Min(1)])
        .split(area);
    f.render_widget(Paragraph::new(lines).centered(), chunks[1]);
}
