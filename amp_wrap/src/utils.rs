use itertools::Itertools;

/// Convert an io::error to a string and strip "(os error 2)" from the end.
fn io_error_to_string(err: &std::io::Error) -> String {
    let s = err.to_string();
    s.strip_suffix(&format!(" (os error {})", err.raw_os_error().unwrap_or(0)))
        .unwrap_or(&s)
        .to_string()
}

/// Format an error chain for the operator.
pub fn format_error_chain(err: &anyhow::Error) -> String {
    let error_chain = err.chain().join("\n\tCaused by: ");
    if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
        let io_err_str = io_error_to_string(io_err);
        match err.chain().len() {
            1 => format!("ERROR: {io_err_str}"),
            2 => format!("ERROR: {io_err_str}: {err}"),
            _ => format!("ERROR: {error_chain}"),
        }
    } else {
        format!("ERROR: {error_chain}")
    }
}

/// Print an error chain to stderr.
pub fn print_error_chain(err: &anyhow::Error) {
    eprintln!("{}", format_error_chain(err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_format_error_chain() {
        let err = anyhow::anyhow!("stage 'denoise' failed with exit code 1")
            .context("running the pipeline");
        assert_eq!(
            format_error_chain(&err),
            "ERROR: running the pipeline\n\tCaused by: stage 'denoise' failed with exit code 1"
        );
    }

    #[test]
    fn test_io_error_suffix_is_stripped() {
        let err = std::fs::read("/nonexistent/amplicon16s/manifest.tsv")
            .context("/nonexistent/amplicon16s/manifest.tsv")
            .unwrap_err();
        assert_eq!(
            format_error_chain(&err),
            "ERROR: No such file or directory: /nonexistent/amplicon16s/manifest.tsv"
        );
    }
}
