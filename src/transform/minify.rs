//! JS and CSS minification.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Both return the parser's
//! message on failure so callers can decide whether it is fatal.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Minify JavaScript source code.
///
/// Top-level names are kept: classic scripts share one global scope.
pub fn minify_js(source: &str, source_type: SourceType) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(error.to_string());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

/// Source type for a script by extension: `.mjs` is a module, anything else
/// a classic script.
pub fn script_source_type(ext: Option<&str>) -> SourceType {
    match ext {
        Some("mjs") => SourceType::mjs(),
        _ => SourceType::script(),
    }
}
