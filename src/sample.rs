/// One packed sample holds two signed 4-bit components in a single byte:
/// the real part in the high nibble and the imaginary part in the low
/// nibble, each stored as an unsigned value biased by +8 so the true
/// range -8..=7 maps onto 0..=15.
pub const SAMPLE_BIAS: i32 = 8;

pub const NIBBLE_MIN: i32 = 0;
pub const NIBBLE_MAX: i32 = 15;

/// Pack a (real, imaginary) pair of true signed values into one byte.
/// Values outside -8..=7 wrap through the nibble mask, matching the
/// packed wire format; callers clip first if they need saturation.
pub fn pack_sample(re: i32, im: i32) -> u8 {
    let biased_re = (re + SAMPLE_BIAS) as u8;
    let biased_im = (im + SAMPLE_BIAS) as u8;
    ((biased_re << 4) & 0xF0) | (biased_im & 0x0F)
}

/// Unpack one byte into the true signed (real, imaginary) pair.
pub fn unpack_sample(byte: u8) -> (i32, i32) {
    let (re, im) = biased_parts(byte);
    (re as i32 - SAMPLE_BIAS, im as i32 - SAMPLE_BIAS)
}

/// The raw biased nibbles (0..=15), as the accelerator kernels see them.
pub fn biased_parts(byte: u8) -> (u8, u8) {
    ((byte >> 4) & 0x0F, byte & 0x0F)
}

/// Offset a value and clip the result into [min_val, max_val].
pub fn offset_and_clip(input_value: i32, offset_value: i32, min_val: i32, max_val: i32) -> i32 {
    let offset = input_value + offset_value;
    if offset > max_val {
        max_val
    } else if offset < min_val {
        min_val
    } else {
        offset
    }
}

/// A (timestep, frequency, element) cube of packed samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCube {
    num_timesteps: usize,
    num_frequencies: usize,
    num_elements: usize,
    data: Vec<u8>,
}

impl SampleCube {
    pub fn new(num_timesteps: usize, num_frequencies: usize, num_elements: usize) -> Self {
        Self {
            num_timesteps,
            num_frequencies,
            num_elements,
            data: vec![0u8; num_timesteps * num_frequencies * num_elements],
        }
    }

    pub fn num_timesteps(&self) -> usize {
        self.num_timesteps
    }

    pub fn num_frequencies(&self) -> usize {
        self.num_frequencies
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    fn address(&self, timestep: usize, frequency: usize, element: usize) -> usize {
        (timestep * self.num_frequencies + frequency) * self.num_elements + element
    }

    pub fn get(&self, timestep: usize, frequency: usize, element: usize) -> u8 {
        self.data[self.address(timestep, frequency, element)]
    }

    pub fn set(&mut self, timestep: usize, frequency: usize, element: usize, byte: u8) {
        let address = self.address(timestep, frequency, element);
        self.data[address] = byte;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
