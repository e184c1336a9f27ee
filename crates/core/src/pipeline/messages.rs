//! Note texts posted to the ticket.

pub const STARTED: &str = "Started merging...";

pub const DOWNLOADED: &str = "Downloaded excel file...";

pub const ASSEMBLY_STARTED: &str =
    "Merged FASTQ files created, beginning assembly of merged files.";

pub const COMPLETED: &str = "Merge Process Complete! Reports attached.";

pub const NO_ATTACHMENT: &str = "ERROR: Did not find any attached files. Please create a new issue \
                                 with the merge excel file attached and try again.";

pub const NO_MERGED_FILES: &str = "ERROR: Something went wrong, no merged FASTQ files were created.";

const FAILURE_PREFIX: &str = "Something went wrong! Send this error traceback to your friendly \
                              neighborhood bioinformatician: ";

/// Note for an unexpected failure.
pub fn failure(error: &impl std::fmt::Display) -> String {
    format!("{}{}", FAILURE_PREFIX, error)
}
