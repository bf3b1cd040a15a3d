//! Adjusts the transcoder invocation before it is forwarded into the pod.
//!
//! The media server hands the transcoder callback URLs pointing at its own
//! loopback address, which is unreachable from another pod. Those are
//! replaced with the server's in-cluster address, and the transcoder log
//! level is raised so failures in the pod can be diagnosed.

/// Callback address the media server passes to a local transcoder.
pub const LOOPBACK_ADDRESS: &str = "http://127.0.0.1:32400";

const CALLBACK_FLAGS: [&str; 3] = ["-progressurl", "-manifest_name", "-segment_list"];
const LOG_LEVEL_FLAGS: [&str; 2] = ["-loglevel", "-loglevel_plex"];
const LOG_LEVEL: &str = "debug";

/// Rewrite transcoder arguments in place.
///
/// The value following a callback flag has its first loopback address
/// replaced with `internal_address` (when one is configured). The value
/// following a log level flag is forced to `debug`. A flag in the last
/// position has no value and is left untouched.
pub fn rewrite_args(args: &mut [String], internal_address: Option<&str>) {
    for i in 0..args.len().saturating_sub(1) {
        let flag = args[i].as_str();
        if CALLBACK_FLAGS.contains(&flag) {
            if let Some(address) = internal_address {
                args[i + 1] = args[i + 1].replacen(LOOPBACK_ADDRESS, address, 1);
            }
        } else if LOG_LEVEL_FLAGS.contains(&flag) {
            args[i + 1] = LOG_LEVEL.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn callback_urls_point_at_internal_address() {
        let mut argv = args(&[
            "Plex Transcoder",
            "-progressurl",
            "http://127.0.0.1:32400/video/:/transcode/session/abc/progress",
            "-manifest_name",
            "http://127.0.0.1:32400/video/:/transcode/session/abc/manifest",
            "-segment_list",
            "http://127.0.0.1:32400/video/:/transcode/session/abc/seglist",
        ]);

        rewrite_args(&mut argv, Some("http://plex.media.svc:32400"));

        assert_eq!(
            argv[2],
            "http://plex.media.svc:32400/video/:/transcode/session/abc/progress"
        );
        assert_eq!(
            argv[4],
            "http://plex.media.svc:32400/video/:/transcode/session/abc/manifest"
        );
        assert_eq!(
            argv[6],
            "http://plex.media.svc:32400/video/:/transcode/session/abc/seglist"
        );
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let mut argv = args(&[
            "-progressurl",
            "http://127.0.0.1:32400/a?next=http://127.0.0.1:32400/b",
        ]);
        rewrite_args(&mut argv, Some("http://pms:32400"));
        assert_eq!(argv[1], "http://pms:32400/a?next=http://127.0.0.1:32400/b");
    }

    #[test]
    fn callback_urls_untouched_without_internal_address() {
        let mut argv = args(&["-progressurl", "http://127.0.0.1:32400/progress"]);
        rewrite_args(&mut argv, None);
        assert_eq!(argv[1], "http://127.0.0.1:32400/progress");
    }

    #[test]
    fn log_levels_forced_to_debug() {
        let mut argv = args(&["-loglevel", "quiet", "-loglevel_plex", "error", "-i", "in.mkv"]);
        rewrite_args(&mut argv, None);
        assert_eq!(argv, args(&["-loglevel", "debug", "-loglevel_plex", "debug", "-i", "in.mkv"]));
    }

    #[test]
    fn trailing_flag_without_value_is_ignored() {
        let mut argv = args(&["Plex Transcoder", "-loglevel"]);
        rewrite_args(&mut argv, Some("http://pms:32400"));
        assert_eq!(argv, args(&["Plex Transcoder", "-loglevel"]));

        let mut empty: Vec<String> = Vec::new();
        rewrite_args(&mut empty, None);
        assert!(empty.is_empty());
    }

    #[test]
    fn unrelated_arguments_are_untouched() {
        let original = args(&["-i", "http://127.0.0.1:32400/library/parts/1/file.mkv"]);
        let mut argv = original.clone();
        rewrite_args(&mut argv, Some("http://pms:32400"));
        assert_eq!(argv, original);
    }
}
