//! End-to-end tests for the download pipeline.
//!
//! A stub media tool stands in for yt-dlp: it serves canned platform
//! metadata and writes a real WAV file of deterministic noise, so tagging,
//! fingerprinting, organizing and cataloguing all run for real.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use discoteca_core::model::{DownloadSource, Overrides};
use discoteca_core::schema::SongFilter;
use discoteca_core::provenance::Source;
use discoteca_etl::{
    Catalog, Config, DownloadError, ImportError, Importer, MediaTool, Pipeline, PipelineError,
    PipelineOutcome, TagError, VideoInfo,
};
use tempfile::TempDir;

/// How the stub answers for one video.
#[derive(Debug, Clone)]
struct Clip {
    info: VideoInfo,
    /// Seed for the generated audio; equal seeds mean equal content.
    seed: u32,
    corrupt: bool,
    fail: bool,
}

#[derive(Debug, Default)]
struct StubTool {
    clips: HashMap<String, Clip>,
    downloads: AtomicUsize,
}

impl StubTool {
    fn with(mut self, id: &str, info: VideoInfo, seed: u32) -> Self {
        self.clips.insert(
            id.to_string(),
            Clip {
                info,
                seed,
                corrupt: false,
                fail: false,
            },
        );
        self
    }

    fn corrupt(mut self, id: &str) -> Self {
        if let Some(clip) = self.clips.get_mut(id) {
            clip.corrupt = true;
        }
        self
    }

    fn failing(mut self, id: &str) -> Self {
        if let Some(clip) = self.clips.get_mut(id) {
            clip.fail = true;
        }
        self
    }

    fn clip(&self, url: &str) -> Result<&Clip, DownloadError> {
        let id = url.rsplit("v=").next().unwrap_or_default();
        self.clips
            .get(id)
            .ok_or_else(|| DownloadError::Failed(format!("Video unavailable: {id}")))
    }
}

#[async_trait]
impl MediaTool for StubTool {
    async fn check_available(&self) -> Result<(), DownloadError> {
        Ok(())
    }

    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        Ok(self.clip(url)?.info.clone())
    }

    async fn fetch_audio(&self, url: &str, dest_dir: &Path, stem: &str) -> Result<PathBuf, DownloadError> {
        let clip = self.clip(url)?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if clip.fail {
            return Err(DownloadError::Failed("HTTP Error 403: Forbidden".into()));
        }
        if clip.corrupt {
            let path = dest_dir.join(format!("{stem}.mp3"));
            std::fs::write(&path, b"not really audio")?;
            return Ok(path);
        }
        let path = dest_dir.join(format!("{stem}.wav"));
        write_wav(&path, clip.seed, 8);
        Ok(path)
    }
}

fn write_wav(path: &Path, seed: u32, seconds: u32) {
    const RATE: u32 = 11_025;
    let frames = RATE * seconds;
    let data_len = frames * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&RATE.to_le_bytes());
    bytes.extend_from_slice(&(RATE * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());

    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    for _ in 0..frames {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let sample = ((state >> 16) as i16) / 4;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

fn info(id: &str, title: &str) -> VideoInfo {
    VideoInfo {
        id: Some(id.to_string()),
        title: title.to_string(),
        webpage_url: Some(format!("https://www.youtube.com/watch?v={id}")),
        duration: Some(8.0),
        ..VideoInfo::default()
    }
}

fn strobe() -> VideoInfo {
    VideoInfo {
        tags: vec!["progressive house".into(), "deadmau5".into()],
        upload_date: Some("20091001".into()),
        channel: Some("deadmau5".into()),
        ..info("tKi9Z-f6qX4", "Deadmau5 - Strobe (Official Audio)")
    }
}

struct Harness {
    dir: TempDir,
    tool: Arc<StubTool>,
    pipeline: Pipeline,
}

impl Harness {
    fn new(tool: StubTool) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default()
            .offline()
            .with_music_folder(dir.path().join("Music"))
            .with_db_path(dir.path().join("discoteca.db"));
        config.scratch_dir = dir.path().join("scratch");
        let tool = Arc::new(tool);
        let pipeline = Pipeline::new(&config, Arc::clone(&tool) as Arc<dyn MediaTool>).unwrap();
        Self { dir, tool, pipeline }
    }

    fn downloads(&self) -> usize {
        self.tool.downloads.load(Ordering::SeqCst)
    }

    fn music(&self) -> PathBuf {
        self.dir.path().join("Music")
    }

    fn catalog(&self) -> &Arc<Catalog> {
        self.pipeline.catalog()
    }

    fn library_files(&self) -> Vec<PathBuf> {
        if !self.music().exists() {
            return Vec::new();
        }
        walkdir::WalkDir::new(self.music())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .collect()
    }

    fn scratch_is_empty(&self) -> bool {
        let scratch = self.dir.path().join("scratch");
        !scratch.exists() || std::fs::read_dir(scratch).unwrap().next().is_none()
    }
}

#[tokio::test]
async fn test_download_is_tagged_organized_and_catalogued() {
    let h = Harness::new(StubTool::default().with("tKi9Z-f6qX4", strobe(), 1));

    let outcome = h
        .pipeline
        .run("https://youtu.be/tKi9Z-f6qX4", &Overrides::default())
        .await
        .unwrap();

    let PipelineOutcome::Stored(record) = outcome else {
        panic!("expected a stored song, got {outcome:?}");
    };
    assert_eq!(record.title, "Strobe");
    assert_eq!(record.artist.as_deref(), Some("Deadmau5"));
    assert_eq!(record.year, Some(2009));
    assert_eq!(record.genre, "Progressive House");
    assert_eq!(record.video_id.as_deref(), Some("tKi9Z-f6qX4"));
    assert_eq!(record.source_url, "https://www.youtube.com/watch?v=tKi9Z-f6qX4");
    assert_eq!(record.download_source, DownloadSource::Download);
    assert_eq!(
        record.file_path,
        h.music().join("Progressive House").join("2000s").join("Deadmau5 - Strobe.wav")
    );
    assert!(record.file_path.exists());
    assert!(record.file_path.is_absolute());

    let (tags, _) = discoteca_etl::tag::read_tags(&record.file_path).unwrap();
    assert_eq!(tags.title.as_deref(), Some("Strobe"));
    assert_eq!(tags.genre.as_deref(), Some("Progressive House"));

    assert_eq!(h.catalog().find_by_video_id("tKi9Z-f6qX4").unwrap(), Some(record));
    assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn test_overrides_win_over_resolved_metadata() {
    let h = Harness::new(StubTool::default().with("tKi9Z-f6qX4", strobe(), 2));
    let overrides = Overrides::default()
        .with_artist("Joel Zimmerman")
        .with_year(2010)
        .with_genre("Electro House");

    let outcome = h
        .pipeline
        .run("https://www.youtube.com/watch?v=tKi9Z-f6qX4&t=42", &overrides)
        .await
        .unwrap();

    let record = outcome.record();
    assert_eq!(record.artist.as_deref(), Some("Joel Zimmerman"));
    assert_eq!(record.year, Some(2010));
    assert_eq!(record.genre, "Electro House");
    assert!(record
        .file_path
        .starts_with(h.music().join("Electro House").join("2010s")));
}

#[tokio::test]
async fn test_same_content_twice_is_a_duplicate() {
    let h = Harness::new(
        StubTool::default()
            .with("tKi9Z-f6qX4", strobe(), 3)
            .with("reupload001", info("reupload001", "strobe (full version)"), 3),
    );

    let first = h
        .pipeline
        .run("https://youtu.be/tKi9Z-f6qX4", &Overrides::default())
        .await
        .unwrap();
    let again = h
        .pipeline
        .run("https://youtu.be/tKi9Z-f6qX4", &Overrides::default())
        .await
        .unwrap();
    let reupload = h
        .pipeline
        .run("https://youtu.be/reupload001", &Overrides::default())
        .await
        .unwrap();

    assert!(!first.is_duplicate());
    assert!(again.is_duplicate());
    assert!(reupload.is_duplicate());
    assert_eq!(again.record().id, first.record().id);
    assert_eq!(reupload.record().id, first.record().id);
    assert_eq!(h.catalog().count().unwrap(), 1);
    assert_eq!(h.library_files(), vec![first.record().file_path.clone()]);
    assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn test_catalogued_video_is_not_downloaded_again() {
    let h = Harness::new(StubTool::default().with("tKi9Z-f6qX4", strobe(), 4));

    let first = h
        .pipeline
        .run("https://www.youtube.com/watch?v=tKi9Z-f6qX4", &Overrides::default())
        .await
        .unwrap();
    assert_eq!(h.downloads(), 1);

    let again = h
        .pipeline
        .run("https://youtu.be/tKi9Z-f6qX4", &Overrides::default().with_genre("Techno"))
        .await
        .unwrap();

    assert!(again.is_duplicate());
    assert_eq!(again.record().id, first.record().id);
    assert_eq!(h.downloads(), 1);
    assert_eq!(h.catalog().count().unwrap(), 1);
    assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn test_unknown_year_and_unknown_genre_folders() {
    let techno = VideoInfo {
        tags: vec!["techno".into()],
        ..info("techno00001", "Untitled Loop")
    };
    let mystery = info("mystery0001", "Mystery Track");
    let h = Harness::new(
        StubTool::default()
            .with("techno00001", techno, 4)
            .with("mystery0001", mystery, 5),
    );

    let techno = h
        .pipeline
        .run("https://youtu.be/techno00001", &Overrides::default())
        .await
        .unwrap();
    let mystery = h
        .pipeline
        .run("https://youtu.be/mystery0001", &Overrides::default())
        .await
        .unwrap();

    assert_eq!(techno.record().year, None);
    assert!(techno
        .record()
        .file_path
        .starts_with(h.music().join("Techno").join("Unknown")));

    assert_eq!(mystery.record().genre, "Sin Clasificar");
    assert_eq!(
        mystery.record().file_path,
        h.music().join("Sin Clasificar").join("Unknown").join("Mystery Track.wav")
    );
}

#[tokio::test]
async fn test_catalog_history_supplies_genre() {
    let first = VideoInfo {
        tags: vec!["deep house".into()],
        ..info("history0001", "Kerri Chandler - Rain")
    };
    let second = info("history0002", "Kerri Chandler - Bar A Thym");
    let h = Harness::new(
        StubTool::default()
            .with("history0001", first, 6)
            .with("history0002", second, 7),
    );

    h.pipeline
        .run("https://youtu.be/history0001", &Overrides::default())
        .await
        .unwrap();
    let outcome = h
        .pipeline
        .run("https://youtu.be/history0002", &Overrides::default())
        .await
        .unwrap();

    assert_eq!(outcome.record().genre, "Deep House");
    let candidate = h
        .pipeline
        .resolver()
        .resolve(
            &discoteca_etl::SourceLink::parse("https://youtu.be/history0002").unwrap(),
            &Overrides::default(),
        )
        .await;
    assert_eq!(candidate.genre.source, Source::CatalogHistory);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests() {
    let h = Harness::new(
        StubTool::default()
            .with("aaaaaaaaaaa", VideoInfo { tags: vec!["house".into()], ..info("aaaaaaaaaaa", "A - One") }, 10)
            .with("bbbbbbbbbbb", VideoInfo { tags: vec!["house".into()], ..info("bbbbbbbbbbb", "B - Two") }, 11)
            .with("ccccccccccc", info("ccccccccccc", "C - Three"), 12)
            .with("ddddddddddd", info("ddddddddddd", "C - Three (Lyrics)"), 12),
    );
    let none = Overrides::default();

    let (a, b, c, d) = tokio::join!(
        h.pipeline.run("https://youtu.be/aaaaaaaaaaa", &none),
        h.pipeline.run("https://youtu.be/bbbbbbbbbbb", &none),
        h.pipeline.run("https://youtu.be/ccccccccccc", &none),
        h.pipeline.run("https://youtu.be/ddddddddddd", &none),
    );

    assert!(!a.unwrap().is_duplicate());
    assert!(!b.unwrap().is_duplicate());
    let (c, d) = (c.unwrap(), d.unwrap());
    assert_ne!(c.is_duplicate(), d.is_duplicate());
    assert_eq!(c.record().id, d.record().id);

    assert_eq!(h.catalog().count().unwrap(), 3);
    assert_eq!(h.library_files().len(), 3);

    let house = h.catalog().search(&SongFilter::new().genre("House")).unwrap();
    assert_eq!(house.len(), 2);
}

#[tokio::test]
async fn test_failed_download_leaves_nothing() {
    let h = Harness::new(
        StubTool::default()
            .with("tKi9Z-f6qX4", strobe(), 20)
            .failing("tKi9Z-f6qX4"),
    );

    let err = h
        .pipeline
        .run("https://youtu.be/tKi9Z-f6qX4", &Overrides::default())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), "download");
    assert!(err.to_string().contains("403"));
    assert!(err.kept_file().is_none());
    assert!(h.library_files().is_empty());
    assert!(h.scratch_is_empty());
    assert_eq!(h.catalog().count().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_tag_keeps_the_download() {
    let h = Harness::new(
        StubTool::default()
            .with("tKi9Z-f6qX4", strobe(), 21)
            .corrupt("tKi9Z-f6qX4"),
    );

    let err = h
        .pipeline
        .run("https://youtu.be/tKi9Z-f6qX4", &Overrides::default())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), "tag");
    assert!(matches!(err, PipelineError::TagWriteFailed { .. }));
    let kept = err.kept_file().unwrap();
    assert!(kept.exists());
    assert!(h.library_files().is_empty());
    assert_eq!(h.catalog().count().unwrap(), 0);
}

#[tokio::test]
async fn test_stats_after_downloads() {
    let h = Harness::new(
        StubTool::default()
            .with("tKi9Z-f6qX4", strobe(), 30)
            .with("mystery0001", info("mystery0001", "Mystery Track"), 31),
    );
    for url in ["https://youtu.be/tKi9Z-f6qX4", "https://youtu.be/mystery0001"] {
        h.pipeline.run(url, &Overrides::default()).await.unwrap();
    }

    let stats = h.catalog().stats().unwrap();
    assert_eq!(stats.total_songs, 2);
    assert!(stats.total_size_bytes > 0);
    assert!(stats.by_genre.contains(&("Progressive House".to_string(), 1)));
    assert!(stats.by_genre.contains(&("Sin Clasificar".to_string(), 1)));
    assert!(stats.by_decade.contains(&("2000s".to_string(), 1)));
}

#[tokio::test]
async fn test_import_directory() {
    let h = Harness::new(StubTool::default());
    let source = TempDir::new().unwrap();
    write_wav(&source.path().join("Moby - Porcelain.wav"), 40, 8);
    std::fs::create_dir(source.path().join("nested")).unwrap();
    write_wav(&source.path().join("nested").join("Porcelain copy.wav"), 40, 8);
    std::fs::write(source.path().join("cover.jpg"), b"jpeg").unwrap();
    let before = std::fs::read(source.path().join("Moby - Porcelain.wav")).unwrap();

    let summary = Importer::new(&h.pipeline)
        .import_dir(source.path(), &Overrides::default().with_genre("Downtempo"))
        .await;

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.stored.len(), 1);
    assert_eq!(summary.duplicates.len(), 1);
    assert!(summary.failed.is_empty());

    let record = &summary.stored[0];
    assert_eq!(record.download_source, DownloadSource::Import);
    assert_eq!(record.genre, "Downtempo");
    assert!(record.source_url.starts_with("file://"));
    assert!(record.file_path.starts_with(h.music().join("Downtempo").join("Unknown")));

    // Sources are read, never modified.
    assert_eq!(std::fs::read(source.path().join("Moby - Porcelain.wav")).unwrap(), before);
    assert!(source.path().join("nested").join("Porcelain copy.wav").exists());
}

#[tokio::test]
async fn test_import_reports_typed_failures() {
    let h = Harness::new(StubTool::default());
    let source = TempDir::new().unwrap();
    write_wav(&source.path().join("Moby - Porcelain.wav"), 41, 8);
    std::fs::write(source.path().join("broken.mp3"), b"not audio at all").unwrap();

    let summary = Importer::new(&h.pipeline)
        .import_dir(source.path(), &Overrides::default())
        .await;

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.stored.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    let (path, err) = &summary.failed[0];
    assert!(path.ends_with("broken.mp3"));
    assert!(matches!(err, ImportError::Tag(TagError::Read { .. })));
    assert!(source.path().join("broken.mp3").exists());
    assert!(h.scratch_is_empty());
}
