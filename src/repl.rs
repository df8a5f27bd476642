use nu_ansi_term::{Color, Style};
use reedline::{
    Highlighter, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    StyledText,
};
use std::borrow::Cow;

use crate::tokenizer::{tokenize_spanned, Token};

pub const BANNER: &str = "MINI BASIC v0.1
Commands: RUN, LIST, NEW
Enter line-numbered statements, e.g. `10 PRINT \"HELLO\"`";

#[derive(Clone)]
pub struct REPLPrompt;

impl Prompt for REPLPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("] ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("  ... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

pub static KEYWORD_COLOR: Color = Color::LightBlue;
pub static LITERAL_COLOR: Color = Color::Yellow;
pub static DEFAULT_COLOR: Color = Color::White;
pub static OPERATOR_COLOR: Color = Color::DarkGray;
pub static ILLEGAL_COLOR: Color = Color::Red;

fn token_color(token: &Token) -> Color {
    match token {
        token if token.is_keyword() => KEYWORD_COLOR,
        token if token.is_operator() => OPERATOR_COLOR,
        Token::Number(_) | Token::String(_) => LITERAL_COLOR,
        Token::LeftParen | Token::RightParen | Token::Comma => OPERATOR_COLOR,
        Token::Illegal(_) => ILLEGAL_COLOR,
        _ => DEFAULT_COLOR,
    }
}

pub struct SyntaxHighlighter;

impl Highlighter for SyntaxHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();
        let mut written = 0;

        for (span, token) in tokenize_spanned(line) {
            if token == Token::EOF {
                break;
            }

            if span.start > written {
                styled_text.push((
                    Style::new().fg(DEFAULT_COLOR),
                    line[written..span.start].to_string(),
                ));
            }

            // everything after REM is comment text
            if token == Token::Rem {
                styled_text.push((Style::new().fg(KEYWORD_COLOR), line[span.clone()].to_string()));
                written = span.end;
                break;
            }

            styled_text.push((Style::new().fg(token_color(&token)), line[span.clone()].to_string()));
            written = span.end;
        }

        if written < line.len() {
            styled_text.push((Style::new().fg(DEFAULT_COLOR), line[written..].to_string()));
        }

        styled_text
    }
}
