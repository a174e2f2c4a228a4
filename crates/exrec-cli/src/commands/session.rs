//! Writer-side commands: init, write-batch, write-notes, finalize, status.

use super::input::read_json;
use super::output::print_json;
use anyhow::{Context, Result};
use exrec_core::session::api::InitRequest;
use exrec_core::session::{
    ConversationRecord, ExperienceRepository, ExperienceSummary, Metadata, SessionId,
};
use serde_json::Value;

pub struct InitArgs {
    pub session_id: Option<String>,
    pub name: String,
    pub context: String,
    pub summary: String,
    pub flow: Vec<String>,
    pub topics: Vec<String>,
    pub metadata: Option<String>,
}

impl InitArgs {
    fn into_request(self) -> Result<InitRequest> {
        let metadata: Metadata = match &self.metadata {
            Some(source) => read_json(source).context("metadata must be a JSON object")?,
            None => Metadata::new(),
        };
        Ok(InitRequest {
            session_id: self.session_id,
            metadata,
            summary: ExperienceSummary {
                name: self.name,
                context: self.context,
                summary: self.summary,
                flow: self.flow,
                topics: self.topics,
            },
        })
    }
}

pub fn init(repo: &impl ExperienceRepository, args: InitArgs) -> Result<()> {
    let response = repo.init(args.into_request()?)?;
    print_json(&response)
}

pub fn write_batch(
    repo: &impl ExperienceRepository,
    session_id: &str,
    batch_number: u32,
    records_source: &str,
) -> Result<()> {
    let session_id = SessionId::parse(session_id)?;
    let records: Vec<ConversationRecord> = read_json(records_source)?;
    let response = repo.write_batch(&session_id, batch_number, records)?;
    print_json(&response)
}

pub fn write_notes(
    repo: &impl ExperienceRepository,
    session_id: &str,
    notes_source: &str,
) -> Result<()> {
    let session_id = SessionId::parse(session_id)?;
    let notes: Value = read_json(notes_source)?;
    let response = repo.write_notes(&session_id, notes)?;
    print_json(&response)
}

pub fn finalize(repo: &impl ExperienceRepository, session_id: &str) -> Result<()> {
    let session_id = SessionId::parse(session_id)?;
    let response = repo.finalize(&session_id)?;
    print_json(&response)
}

pub fn status(repo: &impl ExperienceRepository, session_id: &str) -> Result<()> {
    let session_id = SessionId::parse(session_id)?;
    let response = repo.status(&session_id)?;
    print_json(&response)
}
