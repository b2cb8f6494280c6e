use ratatui::style::Color;

pub const GRID: GridSettings = GridSettings {
    rows: 24,
    cols: 6,
    minutes_per_block: 10,
};

pub const BLOCK_COUNT: usize = GRID.rows * GRID.cols;

pub const UNLINKED_ID: &str = "-1";

pub const ELAPSED_COLOR: Color = Color::Rgb(0, 0, 0);

pub const TIME_SETTINGS: TimeSettings = TimeSettings {
    interval_minutes: 10,
    safety_margin_secs: 1,
    min_delay_secs: 1,
    poll_ms: 250,
};

pub const FILE_PATHS: FilePaths = FilePaths {
    settings: "settings.toml",
    plans_dir: "saved_plans",
    tunes_dir: "tunes",
    log_file: "dayblocks.log",
};

pub const AUDIO: AudioSettings = AudioSettings {
    extensions: &["mp3", "wav", "ogg", "oga", "flac"],
    player: "ffplay",
    player_args: &["-loglevel", "panic", "-nodisp", "-autoexit"],
};

pub struct GridSettings {
    pub rows: usize,
    pub cols: usize,
    pub minutes_per_block: u32,
}

pub struct TimeSettings {
    pub interval_minutes: u32,
    pub safety_margin_secs: i64,
    pub min_delay_secs: i64,
    pub poll_ms: u64,
}

pub struct FilePaths {
    pub settings: &'static str,
    pub plans_dir: &'static str,
    pub tunes_dir: &'static str,
    pub log_file: &'static str,
}

pub struct AudioSettings {
    pub extensions: &'static [&'static str],
    pub player: &'static str,
    pub player_args: &'static [&'static str],
}
