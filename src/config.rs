//! Viewer configuration.
//!
//! Every fixed constant of the scene lives in [`ViewerConfig`]. The defaults
//! reproduce the stock viewer: a 75° camera pushed back by 150 units from a
//! group raised by 50, a grey flat-shaded mesh with a black outline, and a light
//! grey background.

/// A colour given as a `0xRRGGBB` sRGB hex value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Colour(pub u32);

impl Colour {
    pub const WHITE: Colour = Colour(0xffffff);
    pub const BLACK: Colour = Colour(0x000000);

    /// The three 8-bit sRGB channels.
    pub fn to_srgb8(self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        ]
    }

    /// Linear-light RGB, which is what the shaders and the clear colour expect
    /// when rendering to an sRGB surface.
    pub fn to_linear_rgb(self) -> [f32; 3] {
        self.to_srgb8().map(|c| srgb_to_linear(c as f32 / 255.0))
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b] = self.to_linear_rgb();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// How the camera position relates to the group position after setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraPlacement {
    /// The camera shares the group's position handle; the depth offset is applied
    /// through it, so the group ends up at the camera's position and any later
    /// move of one moves the other.
    #[default]
    Aliased,
    /// The camera receives a copy of the group's position plus the depth offset.
    Detached,
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// OBJ file looked up under `assets/` (or `<origin>/assets/` on the web).
    pub model_file: String,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub light_colour: Colour,
    pub light_intensity: f32,
    /// Vertical offset of the group holding the mesh.
    pub group_offset_y: f32,
    /// Distance the camera is pushed back along +z.
    pub camera_depth_offset: f32,
    pub camera_placement: CameraPlacement,
    pub mesh_colour: Colour,
    pub flat_shading: bool,
    pub edge_colour: Colour,
    pub edge_linewidth: f32,
    /// Minimum angle in degrees between adjacent faces for their shared edge to be outlined.
    pub edge_threshold_angle: f32,
    pub clear_colour: Colour,
    pub antialias: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_file: "model.obj".to_string(),
            fov: 75.0,
            near: 1.0,
            far: 1000.0,
            light_colour: Colour::WHITE,
            light_intensity: 2.2,
            group_offset_y: 50.0,
            camera_depth_offset: 150.0,
            camera_placement: CameraPlacement::Aliased,
            mesh_colour: Colour(0xc2c2c2),
            flat_shading: true,
            edge_colour: Colour::BLACK,
            edge_linewidth: 1.0,
            edge_threshold_angle: 1.0,
            clear_colour: Colour(0xcccccc),
            antialias: true,
        }
    }
}
