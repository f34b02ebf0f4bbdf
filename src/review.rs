//! The `map` and `review` commands.
//!
//! Both build a [`Session`] from the input file, apply saved and explicit
//! bindings, and report the result. `review` additionally applies cell
//! edits and prints or exports the canonical rows.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use crate::{
    cli::{InputArgs, MapArgs, MappingArgs, ReviewArgs},
    error::{ReconcileError, ValidationError},
    export,
    fields::FieldSet,
    ingest::ParseOptions,
    io_utils,
    mapping::{self, MappingFile},
    session::Session,
    table,
};

pub fn map(args: &MapArgs) -> Result<()> {
    let session = build_session(&args.input, &args.mapping)?;
    table::print(&table::render_mapping(session.fields(), session.mapping()));
    report_unbound(&session);
    Ok(())
}

pub fn execute(args: &ReviewArgs) -> Result<()> {
    let mut session = build_session(&args.input, &args.mapping)?;
    report_unbound(&session);

    for edit in &args.edits {
        session
            .edit_cell(edit.row, &edit.field, &edit.value)
            .map_err(|err| match err {
                ReconcileError::Validation(ValidationError::RowOutOfRange { index, len }) => {
                    anyhow!("row {} is out of range ({len} row(s) available)", index + 1)
                }
                other => other.into(),
            })
            .with_context(|| format!("Editing row {} field '{}'", edit.row + 1, edit.field))?;
    }
    if !args.edits.is_empty() {
        info!("Applied {} cell edit(s)", args.edits.len());
    }

    match &args.output {
        Some(path) => {
            let input_delimiter = io_utils::resolve_input_delimiter(args.input.delimiter);
            let delimiter = args.output_delimiter.unwrap_or(input_delimiter);
            export::write_rows(
                Some(path.as_path()),
                args.format,
                delimiter,
                session.fields(),
                session.rows(),
            )
            .with_context(|| format!("Exporting rows to {path:?}"))?;
        }
        None => {
            let rows = session.rows();
            let shown = if args.rows == 0 {
                rows
            } else {
                &rows[..rows.len().min(args.rows)]
            };
            table::print(&table::render_canonical(session.fields(), shown));
            info!("Displayed {} of {} row(s)", shown.len(), rows.len());
        }
    }
    Ok(())
}

pub(crate) fn build_session(input: &InputArgs, mapping_args: &MappingArgs) -> Result<Session> {
    let fields = load_fields(mapping_args.fields.as_deref())?;
    let options = parse_options(input)?;
    let mut session = Session::new(fields).with_parse_options(options);
    session
        .load_path(&input.input, input.max_bytes)
        .with_context(|| format!("Loading {:?}", input.input))?;

    if let Some(path) = &mapping_args.mapping {
        let file = MappingFile::load(path)
            .with_context(|| format!("Loading mapping from {path:?}"))?;
        session
            .apply_mapping_file(&file)
            .with_context(|| format!("Applying mapping from {path:?}"))?;
        info!("Applied {} saved binding(s) from {:?}", file.bindings.len(), path);
    }
    for raw in &mapping_args.bindings {
        let (field, column) = mapping::parse_binding(raw)?;
        session
            .set_mapping(&field, &column)
            .with_context(|| format!("Applying mapping '{raw}'"))?;
    }
    for field in &mapping_args.unbind {
        session
            .unbind(field.trim())
            .with_context(|| format!("Clearing mapping for '{field}'"))?;
    }

    if let Some(path) = &mapping_args.save_mapping {
        session
            .mapping()
            .to_file()
            .save(path)
            .with_context(|| format!("Writing mapping to {path:?}"))?;
        info!("Mapping written to {:?}", path);
    }
    Ok(session)
}

pub(crate) fn load_fields(path: Option<&Path>) -> Result<FieldSet> {
    match path {
        Some(path) => {
            FieldSet::load(path).with_context(|| format!("Loading field profile from {path:?}"))
        }
        None => Ok(FieldSet::default()),
    }
}

pub(crate) fn parse_options(input: &InputArgs) -> Result<ParseOptions> {
    Ok(ParseOptions {
        delimiter: io_utils::resolve_input_delimiter(input.delimiter),
        encoding: io_utils::resolve_encoding(input.input_encoding.as_deref())?,
    })
}

fn report_unbound(session: &Session) {
    let unbound = session.unbound_fields();
    if !unbound.is_empty() {
        warn!("Unbound field(s): {}", unbound.join(", "));
    }
}
