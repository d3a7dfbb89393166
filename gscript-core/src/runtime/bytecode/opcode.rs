//! 操作码

use serde::Serialize;

/// 单字节操作码，数值即二进制格式中的编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Opcode {
    Push = 0,
    Assign = 1,
    ArrSet = 2,
    ArrGet = 3,

    // 算术
    Add = 4,
    Sub = 5,
    Mul = 6,
    Div = 7,
    Mod = 8,
    Pow = 9,

    // 自增自减
    Inc = 10,
    IncPush = 11,
    Dec = 12,
    DecPush = 13,

    // 调用
    Call = 14,
    CmdCall = 15,

    // 跳转
    Jmp = 16,
    Jal = 17,
    Ret = 18,

    // 比较
    Eq = 19,
    Lt = 20,
    Gt = 21,
    Lte = 22,
    Gte = 23,

    // 逻辑
    Not = 24,
    And = 25,
    Or = 26,

    // 条件跳转
    Jez = 27,
    Jnz = 28,

    Stop = 29,
    DbgOut = 30,
}

impl Opcode {
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Push => "PUSH",
            Opcode::Assign => "ASSIGN",
            Opcode::ArrSet => "ARR_SET",
            Opcode::ArrGet => "ARR_GET",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Pow => "POW",
            Opcode::Inc => "INC",
            Opcode::IncPush => "INCPUSH",
            Opcode::Dec => "DEC",
            Opcode::DecPush => "DECPUSH",
            Opcode::Call => "CALL",
            Opcode::CmdCall => "CMD_CALL",
            Opcode::Jmp => "JMP",
            Opcode::Jal => "JAL",
            Opcode::Ret => "RET",
            Opcode::Eq => "EQ",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Lte => "LTE",
            Opcode::Gte => "GTE",
            Opcode::Not => "NOT",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Jez => "JEZ",
            Opcode::Jnz => "JNZ",
            Opcode::Stop => "STOP",
            Opcode::DbgOut => "DBG_OUT",
        }
    }

    /// 携带 [`PackedValue`](super::PackedValue) 操作数
    pub fn has_packed_operand(&self) -> bool {
        matches!(self, Opcode::Push | Opcode::Call | Opcode::CmdCall)
    }

    /// 携带相对跳转位移操作数
    pub fn has_jump_operand(&self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::Jal | Opcode::Jez | Opcode::Jnz)
    }

    /// 操作数字节数
    pub fn operand_len(&self) -> usize {
        if self.has_packed_operand() || self.has_jump_operand() {
            super::OPERAND_SIZE
        } else {
            0
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        let op = match byte {
            0 => Opcode::Push,
            1 => Opcode::Assign,
            2 => Opcode::ArrSet,
            3 => Opcode::ArrGet,
            4 => Opcode::Add,
            5 => Opcode::Sub,
            6 => Opcode::Mul,
            7 => Opcode::Div,
            8 => Opcode::Mod,
            9 => Opcode::Pow,
            10 => Opcode::Inc,
            11 => Opcode::IncPush,
            12 => Opcode::Dec,
            13 => Opcode::DecPush,
            14 => Opcode::Call,
            15 => Opcode::CmdCall,
            16 => Opcode::Jmp,
            17 => Opcode::Jal,
            18 => Opcode::Ret,
            19 => Opcode::Eq,
            20 => Opcode::Lt,
            21 => Opcode::Gt,
            22 => Opcode::Lte,
            23 => Opcode::Gte,
            24 => Opcode::Not,
            25 => Opcode::And,
            26 => Opcode::Or,
            27 => Opcode::Jez,
            28 => Opcode::Jnz,
            29 => Opcode::Stop,
            30 => Opcode::DbgOut,
            other => return Err(other),
        };
        Ok(op)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_roundtrip_all() {
        for byte in 0u8..=30 {
            let op = Opcode::try_from(byte).expect("valid opcode");
            assert_eq!(u8::from(op), byte);
        }
        assert_eq!(Opcode::try_from(31), Err(31));
    }

    #[test]
    fn test_fixed_encoding() {
        assert_eq!(Opcode::Push as u8, 0);
        assert_eq!(Opcode::Inc as u8, 10);
        assert_eq!(Opcode::Call as u8, 14);
        assert_eq!(Opcode::Jmp as u8, 16);
        assert_eq!(Opcode::Eq as u8, 19);
        assert_eq!(Opcode::Not as u8, 24);
        assert_eq!(Opcode::Jez as u8, 27);
        assert_eq!(Opcode::Stop as u8, 29);
    }

    #[test]
    fn test_operand_len() {
        assert_eq!(Opcode::Push.operand_len(), 4);
        assert_eq!(Opcode::Jez.operand_len(), 4);
        assert_eq!(Opcode::Ret.operand_len(), 0);
        assert_eq!(Opcode::Add.operand_len(), 0);
    }
}
