use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument, warn};

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    common::timing::{PipelineTimings, Timer},
    conversions::field_mapper::map_negative_fields,
    conversions::pixel_stager::stage_pixels,
    conversions::source::{FileRawSource, RawSource, derive_output_path},
    conversions::types::ConversionConfig,
    dng::{
        CameraProfile, DngError, DngHost, DngImage, DngNegative, MemoryBlock, NegativeWriter, PixelType,
        TiffDngWriter, WriteOptions, tags,
    },
    metadata::{CaptureMetadata, Diagnostic, LoadedMetadata, MetadataLoader},
};

/// Steps of a single conversion run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    Start,
    LoadMetadata,
    ReadRawBuffer,
    BuildImage,
    BuildNegativeFields,
    StageMosaic,
    StageLinearized,
    StageDemosaiced,
    AttachProfile,
    Synchronize,
    Serialize,
    Done,
    Failed,
}

impl ConversionState {
    pub fn name(self) -> &'static str {
        match self {
            ConversionState::Start => "start",
            ConversionState::LoadMetadata => "load_metadata",
            ConversionState::ReadRawBuffer => "read_raw_buffer",
            ConversionState::BuildImage => "build_image",
            ConversionState::BuildNegativeFields => "build_negative_fields",
            ConversionState::StageMosaic => "stage_image_1",
            ConversionState::StageLinearized => "stage_image_2",
            ConversionState::StageDemosaiced => "stage_image_3",
            ConversionState::AttachProfile => "attach_profile",
            ConversionState::Synchronize => "synchronize",
            ConversionState::Serialize => "serialize",
            ConversionState::Done => "done",
            ConversionState::Failed => "failed",
        }
    }
}

/// Inputs of one conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub raw_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
    /// Falls back to the configured default profile.
    pub profile_path: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(raw_path: impl Into<PathBuf>) -> Self {
        Self {
            raw_path: raw_path.into(),
            metadata_path: None,
            profile_path: None,
        }
    }

    pub fn metadata(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    pub fn profile(mut self, path: impl Into<PathBuf>) -> Self {
        self.profile_path = Some(path.into());
        self
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    /// Always [`ConversionState::Done`] for a returned report.
    pub final_state: ConversionState,
    pub diagnostics: Vec<Diagnostic>,
    pub timings: PipelineTimings,
}

/// Tracks the current state and times each step. An error ends the run in
/// `Failed`; callers stop at the first one.
struct Run {
    state: ConversionState,
    timings: PipelineTimings,
}

impl Run {
    fn new() -> Self {
        Self {
            state: ConversionState::Start,
            timings: PipelineTimings::new(),
        }
    }

    fn step<T>(&mut self, state: ConversionState, f: impl FnOnce() -> Result<T>) -> Result<T> {
        debug!(from = self.state.name(), to = state.name(), "State transition");
        self.state = state;
        let _span = tracing::info_span!("step", name = state.name()).entered();
        let timer = Timer::start(state.name());
        let result = f();
        let (name, duration) = timer.stop();
        self.timings.add_step(name, duration);
        if let Err(e) = &result {
            error!(state = state.name(), code = e.code(), kind = ?e.kind(), "{}", e);
            debug!(from = state.name(), to = ConversionState::Failed.name(), "State transition");
        }
        result
    }

    fn finish(mut self) -> (ConversionState, PipelineTimings) {
        debug!(from = self.state.name(), to = ConversionState::Done.name(), "State transition");
        self.state = ConversionState::Done;
        self.timings.log_summary();
        (self.state, self.timings)
    }
}

pub struct RawToDngPipeline<R: RawSource, W: NegativeWriter> {
    source: R,
    writer: W,
    config: ConversionConfig,
}

impl RawToDngPipeline<FileRawSource, TiffDngWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            source: FileRawSource,
            writer: TiffDngWriter,
            config,
        }
    }
}

impl<R: RawSource, W: NegativeWriter> RawToDngPipeline<R, W> {
    pub fn with_custom(source: R, writer: W, config: ConversionConfig) -> Self {
        Self { source, writer, config }
    }

    /// Runs the whole conversion. The output file exists only if every step
    /// succeeded.
    #[instrument(skip(self, request), fields(raw = %request.raw_path.display()))]
    pub fn convert_file(&self, request: &ConversionRequest) -> Result<ConversionReport> {
        let host = match self.config.max_image_samples {
            Some(limit) => DngHost::new().with_max_samples(limit),
            None => DngHost::new(),
        };
        let mut run = Run::new();
        let output_path = derive_output_path(&request.raw_path);
        info!(
            input = %request.raw_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let LoadedMetadata { mut metadata, diagnostics } = run.step(ConversionState::LoadMetadata, || {
            MetadataLoader::new()
                .strict(self.config.strict_metadata)
                .load(request.metadata_path.as_deref())
        })?;
        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }
        metadata.apply_reserved();
        metadata.raw_path = request.raw_path.clone();
        metadata.output_path = output_path.clone();
        metadata.profile_path = request
            .profile_path
            .clone()
            .unwrap_or_else(|| self.config.default_profile.clone());

        let raw = run.step(ConversionState::ReadRawBuffer, || {
            self.source.read_raw(&metadata.raw_path, &host)
        })?;

        let image = run.step(ConversionState::BuildImage, || self.build_image(&host, &metadata, &raw))?;
        drop(raw);

        let mut negative = host.make_negative();
        run.step(ConversionState::BuildNegativeFields, || {
            map_negative_fields(&metadata, &mut negative)?;
            negative.set_software(&self.config.software);
            Ok(())
        })?;

        run.step(ConversionState::StageMosaic, || {
            negative.set_stage1_image(image);
            Ok(())
        })?;
        run.step(ConversionState::StageLinearized, || Ok(negative.build_stage2_image(&host)?))?;
        run.step(ConversionState::StageDemosaiced, || Ok(negative.build_stage3_image(&host)?))?;

        run.step(ConversionState::AttachProfile, || self.attach_profile(&metadata, &mut negative))?;

        run.step(ConversionState::Synchronize, || {
            negative.synchronize_metadata();
            negative.rebuild_embedded_metadata();
            Ok(())
        })?;

        run.step(ConversionState::Serialize, || self.serialize(&host, &negative, &output_path))?;

        let (final_state, timings) = run.finish();
        info!(output = %output_path.display(), "Conversion complete");
        Ok(ConversionReport {
            output_path,
            final_state,
            diagnostics,
            timings,
        })
    }

    fn build_image(&self, host: &DngHost, metadata: &CaptureMetadata, raw: &MemoryBlock) -> Result<DngImage> {
        if self.config.validate_dimensions && (metadata.width == 0 || metadata.height == 0) {
            return Err(ConversionError::InvalidDimensions(metadata.width, metadata.height));
        }
        let buffer = stage_pixels(metadata, raw);
        let mut image = host.make_image(buffer.area, metadata.color_planes, PixelType::Short)?;
        image.put(&buffer)?;
        Ok(image)
    }

    fn attach_profile(&self, metadata: &CaptureMetadata, negative: &mut DngNegative) -> Result<()> {
        let mut profile = CameraProfile::parse_file(&metadata.profile_path)?;
        if profile.name().is_none() && !metadata.profile_name.is_empty() {
            profile.set_ascii(tags::PROFILE_NAME, &metadata.profile_name);
        }
        if profile.copyright().is_none() && !metadata.profile_copy_right.is_empty() {
            profile.set_ascii(tags::PROFILE_COPYRIGHT, &metadata.profile_copy_right);
        }
        info!(profile = ?profile.name(), path = %metadata.profile_path.display(), "Attaching camera profile");
        negative.add_profile(profile);
        Ok(())
    }

    /// Writes into a temporary file next to `output_path` and renames it into
    /// place once complete; on error the temporary file is removed.
    fn serialize(&self, host: &DngHost, negative: &DngNegative, output_path: &Path) -> Result<()> {
        let dir = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut builder = tempfile::Builder::new();
        builder.prefix(".bayer2dng").suffix(".tmp");
        // Temp files are created owner-only; the output gets the usual umask mode.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let mut temp = builder.tempfile_in(dir).map_err(DngError::WriteFile)?;

        let options = WriteOptions {
            version: self.config.dng_version,
            compression: self.config.compression,
            thumbnail_size: self.config.thumbnail_size,
        };
        {
            let mut output = BufWriter::new(temp.as_file_mut());
            self.writer.write_dng(host, &mut output, negative, &options)?;
            output.flush().map_err(DngError::WriteFile)?;
        }
        temp.persist(output_path).map_err(|e| DngError::WriteFile(e.error))?;
        Ok(())
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}
