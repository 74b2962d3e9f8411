mod helpers;
mod history;
mod ingest_workflow;
mod ui_fragments;
