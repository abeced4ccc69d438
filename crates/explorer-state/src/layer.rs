//! Active layer state machine.
//!
//! At most one raster layer is displayed: either a singleband layer or an
//! RGB composite. Activating one replaces the other. The active value is
//! always swapped out whole, never edited field by field, and the tile URL
//! on screen is derived from it alone.

use serde::Serialize;
use tracing::debug;

use explorer_client::urls::{rgb_tile_url, singleband_tile_url};
use explorer_client::{QueryOptions, TileTarget};
use explorer_common::{default_stretch, DatasetIdentity, ExplorerError, ExplorerResult, Metadata, Stretch};

/// One channel of an RGB composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    /// Query parameter prefix: `r`, `g` or `b`.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Red => "r",
            Channel::Green => "g",
            Channel::Blue => "b",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "r" | "red" => Some(Channel::Red),
            "g" | "green" => Some(Channel::Green),
            "b" | "blue" => Some(Channel::Blue),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinglebandLayer {
    pub identity: DatasetIdentity,
    pub colormap: String,
    pub stretch: Stretch,
    /// Stretch is the nominal default, waiting on metadata.
    pub provisional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RgbLayer {
    pub index_keys: Vec<String>,
    pub bands: [String; 3],
    pub stretches: [Stretch; 3],
    pub provisional: [bool; 3],
}

/// What is currently drawn on the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveLayer {
    #[default]
    None,
    Singleband(SinglebandLayer),
    Rgb(RgbLayer),
}

impl ActiveLayer {
    pub fn is_none(&self) -> bool {
        matches!(self, ActiveLayer::None)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ActiveLayer::None => "none",
            ActiveLayer::Singleband(_) => "singleband",
            ActiveLayer::Rgb(_) => "rgb",
        }
    }

    /// Tile URL for the active layer; `None` when nothing is active.
    pub fn tile_url(&self, host: &str, target: TileTarget) -> Option<String> {
        match self {
            ActiveLayer::None => None,
            ActiveLayer::Singleband(layer) => {
                let options = QueryOptions::new()
                    .with("colormap", layer.colormap.as_str())
                    .with("stretch_range", layer.stretch.to_param());
                Some(singleband_tile_url(host, &layer.identity, &options, target))
            }
            ActiveLayer::Rgb(layer) => {
                let mut options = QueryOptions::new();
                for channel in Channel::ALL {
                    options.push(
                        format!("{}_range", channel.as_str()),
                        layer.stretches[channel.index()].to_param(),
                    );
                }
                Some(rgb_tile_url(host, &layer.index_keys, &layer.bands, &options, target))
            }
        }
    }
}

/// RGB band picks made so far, complete or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RgbSelection {
    index_keys: Vec<String>,
    bands: [Option<String>; 3],
    stretches: [Option<(Stretch, bool)>; 3],
}

impl RgbSelection {
    fn for_index(index_keys: &[String]) -> Self {
        Self {
            index_keys: index_keys.to_vec(),
            ..Self::default()
        }
    }

    pub fn index_keys(&self) -> &[String] {
        &self.index_keys
    }

    pub fn band(&self, channel: Channel) -> Option<&str> {
        self.bands[channel.index()].as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.bands.iter().all(Option::is_some)
    }

    fn band_identity(&self, channel: Channel) -> Option<DatasetIdentity> {
        self.band(channel)
            .map(|band| DatasetIdentity::with_band(&self.index_keys, band))
    }

    fn to_layer(&self) -> Option<RgbLayer> {
        let [r, g, b] = self.bands.clone();
        let [sr, sg, sb] = self.stretches;
        let (sr, sg, sb) = (sr?, sg?, sb?);
        Some(RgbLayer {
            index_keys: self.index_keys.clone(),
            bands: [r?, g?, b?],
            stretches: [sr.0, sg.0, sb.0],
            provisional: [sr.1, sg.1, sb.1],
        })
    }
}

/// Outcome of a transition, for logging and re-render scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A layer became active, replacing whatever was there.
    Activated,
    /// The active layer was switched off.
    Deactivated,
    /// The active layer was replaced with an updated copy.
    Updated,
    /// Input recorded but not enough to activate anything yet.
    Pending,
    /// Nothing changed.
    Unchanged,
}

impl Transition {
    /// Whether the view needs to redraw.
    pub fn changed(self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

/// Stretch to start a dataset with, and whether it is still provisional.
fn initial_stretch(metadata: Option<&Metadata>) -> (Stretch, bool) {
    match metadata {
        Some(meta) => (default_stretch(meta), false),
        None => (Stretch::NOMINAL, true),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    active: ActiveLayer,
    colormap: String,
    rgb: RgbSelection,
}

impl LayerState {
    pub fn new(colormap: impl Into<String>) -> Self {
        Self {
            active: ActiveLayer::None,
            colormap: colormap.into(),
            rgb: RgbSelection::default(),
        }
    }

    pub fn active(&self) -> &ActiveLayer {
        &self.active
    }

    /// Colormap applied to the next singleband selection.
    pub fn colormap(&self) -> &str {
        &self.colormap
    }

    pub fn rgb_selection(&self) -> &RgbSelection {
        &self.rgb
    }

    pub fn tile_url(&self, host: &str, target: TileTarget) -> Option<String> {
        self.active.tile_url(host, target)
    }

    /// Toggle a singleband dataset.
    ///
    /// Selecting the dataset already shown switches it off. Anything else
    /// becomes the active layer with the current colormap and a stretch
    /// clipped from its percentiles, or `[0,1]` until metadata arrives.
    pub fn select_singleband(&mut self, identity: DatasetIdentity, metadata: Option<&Metadata>) -> Transition {
        if let ActiveLayer::Singleband(current) = &self.active {
            if current.identity == identity {
                debug!(dataset = %identity, "Singleband layer toggled off");
                self.active = ActiveLayer::None;
                return Transition::Deactivated;
            }
        }

        let (stretch, provisional) = initial_stretch(metadata);
        debug!(dataset = %identity, stretch = %stretch, provisional, "Singleband layer activated");
        self.rgb = RgbSelection::default();
        self.active = ActiveLayer::Singleband(SinglebandLayer {
            identity,
            colormap: self.colormap.clone(),
            stretch,
            provisional,
        });
        Transition::Activated
    }

    /// Assign `band` to one RGB channel.
    ///
    /// The composite only becomes active once all three channels have a
    /// band. Changing the index keys starts a fresh selection.
    pub fn select_rgb_band(
        &mut self,
        index_keys: &[String],
        channel: Channel,
        band: &str,
        metadata: Option<&Metadata>,
    ) -> Transition {
        if self.rgb.index_keys != index_keys {
            self.rgb = RgbSelection::for_index(index_keys);
        }

        let slot = channel.index();
        self.rgb.bands[slot] = Some(band.to_string());
        self.rgb.stretches[slot] = Some(initial_stretch(metadata));

        let Some(layer) = self.rgb.to_layer() else {
            debug!(channel = %channel, band, "RGB band assigned, selection incomplete");
            return Transition::Pending;
        };

        let was_rgb = matches!(self.active, ActiveLayer::Rgb(_));
        debug!(bands = ?layer.bands, "RGB layer activated");
        self.active = ActiveLayer::Rgb(layer);
        if was_rgb {
            Transition::Updated
        } else {
            Transition::Activated
        }
    }

    /// Change the colormap of the active singleband layer.
    pub fn set_colormap(&mut self, colormap: impl Into<String>) -> ExplorerResult<Transition> {
        let colormap = colormap.into();
        let ActiveLayer::Singleband(layer) = &self.active else {
            return Err(ExplorerError::InvalidTransition(
                "colormap can only be changed while a singleband layer is active".to_string(),
            ));
        };
        if layer.colormap == colormap {
            return Ok(Transition::Unchanged);
        }
        self.active = ActiveLayer::Singleband(SinglebandLayer {
            colormap: colormap.clone(),
            ..layer.clone()
        });
        self.colormap = colormap;
        Ok(Transition::Updated)
    }

    /// Colormap for future singleband selections; the active layer is untouched.
    pub fn set_default_colormap(&mut self, colormap: impl Into<String>) {
        self.colormap = colormap.into();
    }

    /// Change the stretch of the active singleband layer.
    pub fn set_stretch(&mut self, stretch: Stretch) -> ExplorerResult<Transition> {
        let ActiveLayer::Singleband(layer) = &self.active else {
            return Err(ExplorerError::InvalidTransition(
                "stretch can only be changed while a singleband layer is active".to_string(),
            ));
        };
        self.active = ActiveLayer::Singleband(SinglebandLayer {
            stretch,
            provisional: false,
            ..layer.clone()
        });
        Ok(Transition::Updated)
    }

    /// Change one channel's stretch of the active RGB layer.
    pub fn set_rgb_stretch(&mut self, channel: Channel, stretch: Stretch) -> ExplorerResult<Transition> {
        let ActiveLayer::Rgb(layer) = &self.active else {
            return Err(ExplorerError::InvalidTransition(
                "channel stretch can only be changed while an RGB layer is active".to_string(),
            ));
        };
        let slot = channel.index();
        let mut next = layer.clone();
        next.stretches[slot] = stretch;
        next.provisional[slot] = false;
        self.rgb.stretches[slot] = Some((stretch, false));
        self.active = ActiveLayer::Rgb(next);
        Ok(Transition::Updated)
    }

    /// Drop whatever is displayed, along with any partial RGB selection.
    pub fn clear(&mut self) -> Transition {
        let had_selection = !self.active.is_none() || self.rgb != RgbSelection::default();
        self.active = ActiveLayer::None;
        self.rgb = RgbSelection::default();
        if had_selection {
            Transition::Deactivated
        } else {
            Transition::Unchanged
        }
    }

    /// Replace provisional stretches for `identity` now that its metadata is known.
    ///
    /// Stretches the user has set explicitly are left alone.
    pub fn refresh_stretch(&mut self, identity: &DatasetIdentity, metadata: &Metadata) -> Transition {
        let stretch = default_stretch(metadata);
        let mut refreshed = false;

        for channel in Channel::ALL {
            let slot = channel.index();
            let matches = self.rgb.band_identity(channel).as_ref() == Some(identity);
            if matches && matches!(self.rgb.stretches[slot], Some((_, true))) {
                self.rgb.stretches[slot] = Some((stretch, false));
                refreshed = true;
            }
        }

        match &self.active {
            ActiveLayer::Singleband(layer) if layer.provisional && &layer.identity == identity => {
                self.active = ActiveLayer::Singleband(SinglebandLayer {
                    stretch,
                    provisional: false,
                    ..layer.clone()
                });
                return Transition::Updated;
            }
            ActiveLayer::Rgb(layer) if refreshed && layer.index_keys == self.rgb.index_keys => {
                if let Some(next) = self.rgb.to_layer() {
                    self.active = ActiveLayer::Rgb(next);
                    return Transition::Updated;
                }
            }
            _ => {}
        }

        if refreshed {
            Transition::Pending
        } else {
            Transition::Unchanged
        }
    }
}

impl Default for LayerState {
    fn default() -> Self {
        Self::new("viridis")
    }
}
